//! Menu filtering
//!
//! Prunes a menu tree down to what an identity may see, keeping the
//! section/item/child structure intact.

use crate::access_control::matcher;
use crate::access_control::types::AllowedFeatureSet;
use crate::catalog::menu::{MenuItem, MenuSection, MenuTree};

/// Filter a menu tree against an allowed feature set.
///
/// - An item survives if its own path is allowed or any child survives.
/// - A surviving item keeps only its surviving children. If none survive but
///   the item itself is allowed, all its children are kept.
/// - Sign-out entries always survive.
/// - A section survives if any of its items survive.
///
/// Applying the filter twice with the same set gives the same tree.
pub fn filter_menu(menu: &MenuTree, allowed: &AllowedFeatureSet) -> MenuTree {
    let sections = menu
        .sections
        .iter()
        .filter_map(|section| filter_section(section, allowed))
        .collect();

    MenuTree { sections }
}

fn filter_section(section: &MenuSection, allowed: &AllowedFeatureSet) -> Option<MenuSection> {
    let items: Vec<MenuItem> = section
        .items
        .iter()
        .filter_map(|item| filter_item(item, allowed))
        .collect();

    if items.is_empty() {
        return None;
    }

    Some(MenuSection {
        title: section.title.clone(),
        items,
    })
}

fn filter_item(item: &MenuItem, allowed: &AllowedFeatureSet) -> Option<MenuItem> {
    if item.is_system() {
        return Some(item.clone());
    }

    let self_allowed = matcher::is_allowed(&item.path, allowed);
    let children: Vec<MenuItem> = item
        .children
        .iter()
        .filter_map(|child| filter_item(child, allowed))
        .collect();

    if !children.is_empty() {
        return Some(MenuItem {
            children,
            ..item_without_children(item)
        });
    }

    // Parent allowed: its children stay visible
    self_allowed.then(|| item.clone())
}

fn item_without_children(item: &MenuItem) -> MenuItem {
    MenuItem {
        path: item.path.clone(),
        label: item.label.clone(),
        icon: item.icon.clone(),
        children: Vec::new(),
    }
}
