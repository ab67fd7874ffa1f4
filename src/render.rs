//! Plain-text rendering shared by one-shot commands and the shell.

use cloudshelf_core::{Container, Entry, Instance, Listing, Vpc, format_size};
use cloudshelf_nav::DirectoryView;
use cloudshelf_ops::{InstanceBoard, LifecycleGuard, PendingAction};
use itertools::Itertools;

const RULE_WIDTH: usize = 70;

fn rule() {
    println!("{}", "─".repeat(RULE_WIDTH));
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}

pub fn print_containers(containers: &[Container]) {
    if containers.is_empty() {
        println!(" No buckets.");
        return;
    }
    println!(
        " {:<32} {:<14} {:>8} {:>10}  {}",
        "NAME", "REGION", "OBJECTS", "SIZE", "CREATED"
    );
    for c in containers {
        let objects = c
            .object_count
            .map_or_else(|| "N/A".to_string(), |n| n.to_string());
        println!(
            " {:<32} {:<14} {:>8} {:>10}  {}",
            truncate(&c.name, 32),
            truncate(&c.region, 14),
            objects,
            format_size(c.size),
            c.created.format("%Y-%m-%d %H:%M")
        );
    }
}

pub fn print_listing(container: &str, listing: &Listing) {
    println!(" {container}:/{}", listing.current_prefix);
    rule();
    if listing.is_empty() {
        println!(" (empty)");
        return;
    }
    for entry in listing.entries() {
        match entry {
            Entry::Folder(folder) => {
                let items = folder
                    .file_count
                    .map_or_else(|| "—".to_string(), |n| format!("{n} items"));
                let size = folder.size.map_or_else(|| "—".to_string(), format_size);
                println!(
                    " ▸ {:<40} {:>10} {:>10}",
                    truncate(&format!("{}/", folder.name), 40),
                    items,
                    size
                );
            }
            Entry::File(file) => println!(
                "   {:<40} {:>10}  {}",
                truncate(&file.name, 40),
                format_size(file.size),
                file.last_modified.format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

/// Print whatever the view currently shows.
pub fn print_view(view: &DirectoryView) {
    match view.selected() {
        None => print_containers(view.containers()),
        Some(container) => {
            let crumbs = std::iter::once(container.name.as_str())
                .chain(view.breadcrumbs().iter().map(|b| b.name.as_str()))
                .join(" › ");
            println!(" {crumbs}");
            print_listing(&container.name, view.listing());
        }
    }
    if let Some(err) = view.error() {
        println!(" ! {err}");
    }
}

pub fn print_instances(board: &InstanceBoard) {
    let instances = board.instances();
    if instances.is_empty() {
        println!(" No instances.");
        return;
    }
    println!(
        " {:<20} {:<20} {:<14} {:<11} {:<15} {:<15} {}",
        "ID", "NAME", "STATE", "TYPE", "PUBLIC IP", "PRIVATE IP", "ACTIONS"
    );
    for i in instances {
        let actions = if board.is_busy(&i.id) {
            "(busy)".to_string()
        } else {
            LifecycleGuard::allowed_actions(i.state).iter().join(",")
        };
        println!(
            " {:<20} {:<20} {:<14} {:<11} {:<15} {:<15} {}",
            i.id,
            truncate(&i.name, 20),
            i.state.to_string(),
            i.instance_type,
            i.public_ip.as_deref().unwrap_or("—"),
            i.private_ip.as_deref().unwrap_or("—"),
            actions
        );
    }
}

pub fn print_instance(instance: &Instance) {
    println!(" {} ({})", instance.id, instance.name);
    println!("   state:    {}", instance.state);
    println!("   type:     {}", instance.instance_type);
    println!("   platform: {}", instance.platform);
    if let Some(launched) = instance.launched {
        println!("   launched: {}", launched.format("%Y-%m-%d %H:%M"));
    }
}

pub fn print_vpcs(vpcs: &[&Vpc]) {
    if vpcs.is_empty() {
        println!(" No VPCs match.");
        return;
    }
    println!(
        " {:<24} {:<24} {:<18} {:<10} {:<8} {}",
        "ID", "NAME", "CIDR", "STATE", "DEFAULT", "TENANCY"
    );
    for v in vpcs {
        println!(
            " {:<24} {:<24} {:<18} {:<10} {:<8} {}",
            v.id,
            truncate(&v.name, 24),
            v.cidr_block,
            v.state,
            if v.is_default { "yes" } else { "no" },
            v.tenancy
        );
    }
}

/// Print the confirmation text of a pending action.
pub fn print_pending(action: &PendingAction) {
    rule();
    println!(" {}", action.title());
    println!(" {}", action.message());
    if let Some(details) = action.details() {
        println!(" {details}");
    }
    if let Some(warning) = action.warning() {
        println!(" ⚠ {warning}");
    }
    rule();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-bucket-name", 8), "a-very-…");
    }
}
