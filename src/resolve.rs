//! Relation attribute resolution
//!
//! A way can sit in any number of route relations. The attributes it
//! inherits come from walking those relations in membership order and
//! letting later values override earlier ones.

use crate::relations::RouteInfo;

/// Route attributes inherited by one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAttributes {
    pub route_ref: Option<String>,
    pub name: Option<String>,
    pub colour: Option<String>,
    pub network: Option<String>,
}

/// Fold an element's routes, in membership order, into one attribute set.
///
/// `ref`, `name` and `colour`: the last non-null value wins, a null never
/// erases an earlier value.
///
/// `network` is only overwritten once it already holds a value, and since it
/// starts out empty it is never set. Tiles published so far carry no
/// `relation_network`, so this is kept as is until that output changes on
/// purpose.
pub fn resolve<'a, I>(routes: I) -> ResolvedAttributes
where
    I: IntoIterator<Item = &'a RouteInfo>,
{
    let mut resolved = ResolvedAttributes::default();

    for route in routes {
        if route.route_ref.is_some() {
            resolved.route_ref.clone_from(&route.route_ref);
        }
        if route.name.is_some() {
            resolved.name.clone_from(&route.name);
        }
        if route.colour.is_some() {
            resolved.colour.clone_from(&route.colour);
        }
        if resolved.network.is_some() {
            resolved.network.clone_from(&route.network);
        }
    }

    resolved
}
