//! Static port-to-service and port-to-protocol tables.
//!
//! Both lookups are pure and total. The service table labels whatever a
//! probe touched; the protocol table is narrower and only feeds the
//! deduplicated protocol list on a host.

/// Well-known service name for a port, `"Unknown"` when unmapped.
pub fn service_name(port: u16) -> &'static str {
    match port {
        20 => "FTP-Data",
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        67 => "DHCP",
        68 => "DHCP-Client",
        69 => "TFTP",
        80 => "HTTP",
        88 => "Kerberos",
        110 => "POP3",
        123 => "NTP",
        135 => "MSRPC",
        139 => "NetBIOS-SSN",
        143 => "IMAP",
        161 => "SNMP",
        162 => "SNMP-Trap",
        389 => "LDAP",
        443 => "HTTPS",
        445 => "SMB",
        465 => "SMTPS",
        514 => "Syslog",
        515 => "LPD",
        587 => "SMTP-Submission",
        631 => "IPP",
        636 => "LDAPS",
        873 => "RSync",
        993 => "IMAPS",
        995 => "POP3S",
        1194 => "OpenVPN",
        1433 => "MSSQL",
        1723 => "PPTP",
        2049 => "NFS",
        3000 => "Node.js",
        3306 => "MySQL",
        3389 => "RDP",
        5000 => "Flask",
        5060 => "SIP",
        5061 => "SIPS",
        5432 => "PostgreSQL",
        5900 => "VNC",
        5901 => "VNC-1",
        5902 => "VNC-2",
        6379 => "Redis",
        8000 => "HTTP-Alt",
        8001 => "HTTP-Alt",
        8008 => "HTTP-Alt",
        8080 => "HTTP-Proxy",
        8081 => "HTTP-Proxy-Alt",
        8443 => "HTTPS-Alt",
        8880 => "HTTP-Alt",
        8888 => "HTTP-Alt",
        9000 => "SonarQube",
        9090 => "Prometheus",
        9100 => "JetDirect",
        25565 => "Minecraft",
        27015 => "Steam",
        27017 => "MongoDB",
        _ => "Unknown",
    }
}

/// Application protocol inferred from an open port, if any.
pub fn protocol_for_port(port: u16) -> Option<&'static str> {
    let protocol = match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 | 8080 => "HTTP",
        110 => "POP3",
        143 => "IMAP",
        443 | 8443 => "HTTPS",
        445 => "SMB",
        3306 => "MySQL",
        3389 => "RDP",
        5432 => "PostgreSQL",
        5900 => "VNC",
        _ => return None,
    };
    Some(protocol)
}
