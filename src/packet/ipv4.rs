//! IPv4 选项区的读取与重写

use pnet_packet::ethernet::{EtherTypes, EthernetPacket};
use pnet_packet::ipv4::{self, Ipv4Packet, MutableIpv4Packet};

use crate::error::{Error, Result};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const IPV4_MIN_HEADER_LEN: usize = 20;
/// IHL 最大为 15 个 32 位字，去掉 20 字节定长头部后剩 40 字节。
pub const IPV4_MAX_OPTIONS_LEN: usize = 40;

/// End of Option List
pub const OPTION_END: u8 = 0;
/// No Operation
pub const OPTION_NOP: u8 = 1;

/// 一个 IPv4 选项。`data` 不含 type/length 两个字节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpOption {
    pub kind: u8,
    pub data: Vec<u8>,
}

impl IpOption {
    pub fn new(kind: u8, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn nop() -> Self {
        Self::new(OPTION_NOP, Vec::new())
    }

    fn is_single_byte(&self) -> bool {
        self.kind == OPTION_END || self.kind == OPTION_NOP
    }

    /// 线上占用的字节数
    pub fn wire_len(&self) -> usize {
        if self.is_single_byte() {
            1
        } else {
            2 + self.data.len()
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.kind);
        if self.is_single_byte() {
            return Ok(());
        }
        let len = u8::try_from(self.wire_len())
            .map_err(|_| Error::codec(format!("option {} is too long", self.kind)))?;
        out.push(len);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// IPv4 层在帧内的位置（均为相对 IP 头起点的字节数）
#[derive(Debug, Clone, Copy)]
struct Ipv4Layout {
    header_len: usize,
    total_len: usize,
}

fn locate_ipv4(frame: &[u8]) -> Result<Option<Ipv4Layout>> {
    let Some(eth) = EthernetPacket::new(frame) else {
        return Ok(None);
    };
    if eth.get_ethertype() != EtherTypes::Ipv4 {
        return Ok(None);
    }

    let ip_bytes = &frame[ETHERNET_HEADER_LEN..];
    let ip = Ipv4Packet::new(ip_bytes)
        .ok_or_else(|| Error::codec(format!("truncated IPv4 header ({} bytes)", ip_bytes.len())))?;
    if ip.get_version() != 4 {
        return Err(Error::codec(format!(
            "unexpected IP version {}",
            ip.get_version()
        )));
    }

    let header_len = ip.get_header_length() as usize * 4;
    if header_len < IPV4_MIN_HEADER_LEN || header_len > ip_bytes.len() {
        return Err(Error::codec(format!(
            "bad IPv4 header length {header_len} for {} available bytes",
            ip_bytes.len()
        )));
    }
    let declared = ip.get_total_length() as usize;
    if declared < header_len {
        return Err(Error::codec(format!(
            "IPv4 total length {declared} shorter than header length {header_len}"
        )));
    }

    // 抓包截断时按实际可用字节处理
    Ok(Some(Ipv4Layout {
        header_len,
        total_len: declared.min(ip_bytes.len()),
    }))
}

/// 帧是否带 IPv4 层（只看以太类型，不校验头部）
pub fn is_ipv4(frame: &[u8]) -> bool {
    EthernetPacket::new(frame).is_some_and(|eth| eth.get_ethertype() == EtherTypes::Ipv4)
}

fn parse_options(raw: &[u8]) -> Result<Vec<IpOption>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let kind = raw[i];
        match kind {
            OPTION_END => break,
            OPTION_NOP => {
                out.push(IpOption::nop());
                i += 1;
            }
            _ => {
                let len = *raw
                    .get(i + 1)
                    .ok_or_else(|| Error::codec(format!("option {kind} has no length byte")))?
                    as usize;
                if len < 2 || i + len > raw.len() {
                    return Err(Error::codec(format!(
                        "option {kind} declares length {len} with {} bytes left",
                        raw.len() - i
                    )));
                }
                out.push(IpOption::new(kind, raw[i + 2..i + len].to_vec()));
                i += len;
            }
        }
    }
    Ok(out)
}

/// 读取帧的 IPv4 选项列表。
///
/// 不是以太网/IPv4 帧时返回 `Ok(None)`；选项区格式错误时返回 `Error::Codec`。
pub fn ipv4_options(frame: &[u8]) -> Result<Option<Vec<IpOption>>> {
    let Some(layout) = locate_ipv4(frame)? else {
        return Ok(None);
    };
    let start = ETHERNET_HEADER_LEN + IPV4_MIN_HEADER_LEN;
    let end = ETHERNET_HEADER_LEN + layout.header_len;
    parse_options(&frame[start..end]).map(Some)
}

/// 用 `options` 整体替换帧的 IPv4 选项区，返回新帧。
///
/// 选项区按 4 字节对齐补 End-of-List，随后重算 IHL、总长度与头部校验和。
/// IP 负载和总长度之后的链路层填充原样保留。
pub fn rewrite_ipv4_options(frame: &[u8], options: &[IpOption]) -> Result<Vec<u8>> {
    let layout =
        locate_ipv4(frame)?.ok_or_else(|| Error::codec("frame carries no IPv4 layer"))?;

    let mut raw_opts = Vec::with_capacity(IPV4_MAX_OPTIONS_LEN);
    for opt in options {
        opt.write_to(&mut raw_opts)?;
    }
    while raw_opts.len() % 4 != 0 {
        raw_opts.push(OPTION_END);
    }
    if raw_opts.len() > IPV4_MAX_OPTIONS_LEN {
        return Err(Error::codec(format!(
            "{} bytes of IPv4 options exceed the {IPV4_MAX_OPTIONS_LEN} byte limit",
            raw_opts.len()
        )));
    }

    let ip_start = ETHERNET_HEADER_LEN;
    let ip_payload = &frame[ip_start + layout.header_len..ip_start + layout.total_len];
    let trailer = &frame[ip_start + layout.total_len..];

    let header_len = IPV4_MIN_HEADER_LEN + raw_opts.len();
    let total_len = u16::try_from(header_len + ip_payload.len())
        .map_err(|_| Error::codec("rewritten IPv4 packet exceeds 65535 bytes"))?;

    let mut out = Vec::with_capacity(frame.len() + raw_opts.len());
    out.extend_from_slice(&frame[..ip_start + IPV4_MIN_HEADER_LEN]);
    out.extend_from_slice(&raw_opts);
    out.extend_from_slice(ip_payload);
    out.extend_from_slice(trailer);

    {
        let mut ip = MutableIpv4Packet::new(&mut out[ip_start..])
            .ok_or_else(|| Error::codec("rewritten IPv4 header is truncated"))?;
        ip.set_header_length((header_len / 4) as u8);
        ip.set_total_length(total_len);
        ip.set_checksum(0);
        let checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(checksum);
    }

    Ok(out)
}
