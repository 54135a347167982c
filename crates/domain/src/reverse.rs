use std::net::IpAddr;

use crate::ResolveError;

/// Builds the PTR owner name for an address: reversed octets under
/// `in-addr.arpa` for IPv4, reversed nibbles under `ip6.arpa` for IPv6.
pub fn reverse_address(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            format!(
                "{}.{}.{}.{}.in-addr.arpa",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(ipv6) => {
            let mut name = String::with_capacity(72);
            for byte in ipv6.octets().iter().rev() {
                name.push(nibble(byte & 0x0f));
                name.push('.');
                name.push(nibble(byte >> 4));
                name.push('.');
            }
            name.push_str("ip6.arpa");
            name
        }
    }
}

/// Text form of [`reverse_address`].
pub fn reverse_address_str(ip: &str) -> Result<String, ResolveError> {
    let addr: IpAddr = ip
        .trim()
        .parse()
        .map_err(|_| ResolveError::BadQuery(format!("Invalid IP address: {}", ip)))?;
    Ok(reverse_address(&addr))
}

fn nibble(value: u8) -> char {
    char::from_digit(u32::from(value), 16).unwrap_or('0')
}
