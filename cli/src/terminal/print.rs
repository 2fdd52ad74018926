use std::collections::HashMap;

use colored::*;
use lansweep_common::model::HostResult;

/// Renders one block per discovered host, sorted by address for stable
/// reading; the engine itself reports hosts in completion order.
pub fn render(results: &[HostResult]) {
    if results.is_empty() {
        println!("{}", "No hosts discovered.".yellow().bold());
        return;
    }

    let mut hosts: Vec<&HostResult> = results.iter().collect();
    hosts.sort_by_key(|host| host.ip);

    for host in hosts {
        let hostname = host.hostname.as_deref().unwrap_or("no hostname");
        println!(
            "{} {} ({})",
            "▸".cyan().bold(),
            host.ip.to_string().bold(),
            hostname.dimmed()
        );

        if let Some(mac) = host.mac {
            println!("    MAC      {}  {}", mac, host.vendor.dimmed());
        }
        println!("    Type     {}", host.device_type.green());
        if !host.protocols.is_empty() {
            println!("    Protocols {}", host.protocols.join(", "));
        }
        for probe in &host.ports {
            let state_text = probe.state.to_string();
            let state = if probe.state.is_open() {
                state_text.green()
            } else {
                state_text.red()
            };
            println!(
                "    {:>5}/{}  {}  {}",
                probe.port, probe.transport, state, probe.service
            );
        }
        println!();
    }
}

/// Aggregate view: device-type counts and the most common open ports.
pub fn summary(results: &[HostResult]) {
    if results.is_empty() {
        return;
    }

    let mut device_types: HashMap<&str, usize> = HashMap::new();
    let mut open_ports: HashMap<u16, usize> = HashMap::new();
    for host in results {
        *device_types.entry(host.device_type.as_str()).or_default() += 1;
        for port in host.open_ports() {
            *open_ports.entry(port).or_default() += 1;
        }
    }

    println!(
        "{}",
        format!("{} hosts discovered", results.len()).bold().green()
    );

    let mut device_types: Vec<_> = device_types.into_iter().collect();
    device_types.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (label, count) in device_types {
        println!("  {count:>3}  {label}");
    }

    let mut open_ports: Vec<_> = open_ports.into_iter().collect();
    open_ports.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    if !open_ports.is_empty() {
        println!("{}", "Most common open ports:".bold());
        for (port, count) in open_ports.into_iter().take(10) {
            println!(
                "  {count:>3}  {port} ({})",
                lansweep_common::service::service_name(port)
            );
        }
    }
}
