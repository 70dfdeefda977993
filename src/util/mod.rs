//! Host network info queries.
//!
//! Best-effort discovery of the first non-loopback IPv4 address and its
//! subnet mask. Results are strings; an empty string means "unknown" and is
//! a valid answer, not an error. Queries walk the interface table fresh on
//! every call because the device network configuration can change between
//! requests.

/// Get the host's first non-loopback IPv4 address, or `""` if none.
pub fn host_ip_address() -> String {
    first_nonloopback_v4()
        .map(|(addr, _)| addr.to_string())
        .unwrap_or_default()
}

/// Get the subnet mask of the host's first non-loopback IPv4 interface,
/// or `""` if none.
pub fn host_netmask() -> String {
    first_nonloopback_v4()
        .and_then(|(_, mask)| mask)
        .map(|mask| mask.to_string())
        .unwrap_or_default()
}

/// Walk the interface table and return the first non-loopback IPv4 address
/// with its netmask.
#[cfg(unix)]
fn first_nonloopback_v4() -> Option<(std::net::Ipv4Addr, Option<std::net::Ipv4Addr>)> {
    use std::net::Ipv4Addr;

    let mut result = None;

    unsafe {
        let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();
        if libc::getifaddrs(std::ptr::addr_of_mut!(ifaddrs)) != 0 {
            return None;
        }

        let mut current = ifaddrs;
        while !current.is_null() {
            let ifa = &*current;

            if !ifa.ifa_addr.is_null() && i32::from((*ifa.ifa_addr).sa_family) == libc::AF_INET {
                #[allow(clippy::cast_ptr_alignment)]
                let sockaddr = ifa.ifa_addr.cast::<libc::sockaddr_in>();
                let addr = Ipv4Addr::from(u32::from_be((*sockaddr).sin_addr.s_addr));

                if !addr.is_loopback() {
                    let netmask = if ifa.ifa_netmask.is_null() {
                        None
                    } else {
                        #[allow(clippy::cast_ptr_alignment)]
                        let mask = ifa.ifa_netmask.cast::<libc::sockaddr_in>();
                        Some(Ipv4Addr::from(u32::from_be((*mask).sin_addr.s_addr)))
                    };

                    result = Some((addr, netmask));
                    break;
                }
            }

            current = ifa.ifa_next;
        }

        libc::freeifaddrs(ifaddrs);
    }

    result
}

#[cfg(not(unix))]
fn first_nonloopback_v4() -> Option<(std::net::Ipv4Addr, Option<std::net::Ipv4Addr>)> {
    None
}
