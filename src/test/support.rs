use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{self, MutableIpv4Packet};
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;

pub fn eth_header(ethertype: u16) -> Vec<u8> {
    let mut v = vec![0x02, 0, 0, 0, 0, 0x01, 0x02, 0, 0, 0, 0, 0x02];
    v.extend_from_slice(&ethertype.to_be_bytes());
    v
}

/// Ethernet + IPv4（带给定选项区）+ UDP
pub fn ipv4_udp_frame(options: &[u8], payload: &[u8]) -> Vec<u8> {
    assert!(options.len() % 4 == 0 && options.len() <= 40);
    let header_len = 20 + options.len();
    let udp_len = 8 + payload.len();
    let total = header_len + udp_len;

    let mut ip_buf = vec![0u8; total];
    {
        let mut ip = MutableIpv4Packet::new(&mut ip_buf).expect("ip buffer");
        ip.set_version(4);
        ip.set_header_length((header_len / 4) as u8);
        ip.set_total_length(total as u16);
        ip.set_ttl(64);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        ip.set_source(Ipv4Addr::new(10, 0, 0, 1));
        ip.set_destination(Ipv4Addr::new(10, 0, 0, 2));
    }
    ip_buf[20..header_len].copy_from_slice(options);

    let udp = &mut ip_buf[header_len..];
    udp[0..2].copy_from_slice(&4000_u16.to_be_bytes());
    udp[2..4].copy_from_slice(&5000_u16.to_be_bytes());
    udp[4..6].copy_from_slice(&(udp_len as u16).to_be_bytes());
    udp[8..].copy_from_slice(payload);

    {
        let mut ip = MutableIpv4Packet::new(&mut ip_buf).expect("ip buffer");
        let checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(checksum);
    }

    let mut frame = eth_header(ETHERTYPE_IPV4);
    frame.extend_from_slice(&ip_buf);
    frame
}

pub fn plain_frame(payload: &[u8]) -> Vec<u8> {
    ipv4_udp_frame(&[], payload)
}

pub fn arp_frame() -> Vec<u8> {
    let mut frame = eth_header(ETHERTYPE_ARP);
    frame.extend_from_slice(&[0u8; 28]);
    frame
}

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "covert-relay-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
