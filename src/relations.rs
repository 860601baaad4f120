//! Route relation pass
//!
//! The first pass walks every relation once, keeps the railway route
//! relations, and indexes them by member so the feature pass can look up a
//! way's routes in O(1). Once built the cache is never written again.

use std::fmt;
use std::sync::Arc;

use railway_common::{TagMap, Tags};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKind {
    Node = 0,
    Way = 1,
    Relation = 2,
}

impl MemberKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(MemberKind::Node),
            1 => Some(MemberKind::Way),
            2 => Some(MemberKind::Relation),
            _ => None,
        }
    }
}

/// Identity of a relation member: element kind plus OSM id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemberRef {
    pub kind: MemberKind,
    pub id: i64,
}

impl MemberRef {
    pub fn node(id: i64) -> Self {
        Self {
            kind: MemberKind::Node,
            id,
        }
    }

    pub fn way(id: i64) -> Self {
        Self {
            kind: MemberKind::Way,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub role: String,
    pub kind: MemberKind,
    pub ref_id: i64,
}

impl Member {
    pub fn member_ref(&self) -> MemberRef {
        MemberRef {
            kind: self.kind,
            id: self.ref_id,
        }
    }
}

/// A relation as the host hands it to the relation pass
pub trait RelationSource: Tags {
    fn id(&self) -> i64;
    fn members(&self) -> &[Member];
}

/// Owned relation for hosts without their own record type
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<Member>,
    pub tags: TagMap,
}

impl Tags for Relation {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.tags.get_str(key)
    }
}

impl RelationSource for Relation {
    fn id(&self) -> i64 {
        self.id
    }

    fn members(&self) -> &[Member] {
        &self.members
    }
}

/// Transport mode of a route relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Subway,
    Tram,
    Train,
    LightRail,
    Railway,
}

impl RouteKind {
    pub const ALL: [RouteKind; 5] = [
        RouteKind::Subway,
        RouteKind::Tram,
        RouteKind::Train,
        RouteKind::LightRail,
        RouteKind::Railway,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RouteKind::Subway => "subway",
            RouteKind::Tram => "tram",
            RouteKind::Train => "train",
            RouteKind::LightRail => "light_rail",
            RouteKind::Railway => "railway",
        }
    }

    /// Parse a `route=*` value; anything outside the railway modes is `None`
    pub fn from_tag(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == value)
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes extracted from one railway route relation.
///
/// Held in RAM for the whole run, so only the five tags the feature pass
/// reads are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub relation_id: i64,
    pub name: Option<String>,
    pub route_ref: Option<String>,
    pub kind: RouteKind,
    pub colour: Option<String>,
    pub network: Option<String>,
}

impl RouteInfo {
    /// Extract route attributes, or `None` for anything that is not a
    /// `type=route` relation of a railway mode
    pub fn from_relation<R: RelationSource + ?Sized>(relation: &R) -> Option<Self> {
        if !relation.has_tag("type", &["route"]) {
            return None;
        }
        let kind = RouteKind::from_tag(relation.get_str("route")?)?;

        Some(RouteInfo {
            relation_id: relation.id(),
            name: relation.get_string("name"),
            route_ref: relation.get_string("ref"),
            kind,
            colour: relation.get_string("colour"),
            network: relation.get_string("network"),
        })
    }
}

/// A route an element belongs to, with the member role it holds there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub role: String,
    pub route: Arc<RouteInfo>,
}

/// Write-once builder for the route cache
#[derive(Debug, Default)]
pub struct RouteCacheBuilder {
    routes: FxHashMap<i64, Arc<RouteInfo>>,
    memberships: FxHashMap<MemberRef, Vec<Membership>>,
    seen: usize,
}

impl RouteCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one relation.
    ///
    /// Returns the extracted route when the relation qualifies. A relation
    /// id that is already cached keeps its first record.
    pub fn register<R: RelationSource + ?Sized>(
        &mut self,
        relation: &R,
    ) -> Option<Arc<RouteInfo>> {
        self.seen += 1;
        let info = RouteInfo::from_relation(relation)?;
        self.insert(info, relation.members())
    }

    /// Register a batch of relations.
    ///
    /// Tag extraction runs in parallel; insertion follows input order so
    /// membership lists come out the same on every run.
    pub fn register_all<R: RelationSource + Sync>(&mut self, relations: &[R]) -> usize {
        let extracted: Vec<Option<RouteInfo>> = relations
            .par_iter()
            .map(|r| RouteInfo::from_relation(r))
            .collect();

        self.seen += relations.len();
        let mut registered = 0;
        for (relation, info) in relations.iter().zip(extracted) {
            if let Some(info) = info {
                if self.insert(info, relation.members()).is_some() {
                    registered += 1;
                }
            }
        }
        registered
    }

    fn insert(&mut self, info: RouteInfo, members: &[Member]) -> Option<Arc<RouteInfo>> {
        if self.routes.contains_key(&info.relation_id) {
            warn!(
                relation_id = info.relation_id,
                "route relation registered twice, keeping the first record"
            );
            return None;
        }

        let info = Arc::new(info);
        self.routes.insert(info.relation_id, Arc::clone(&info));
        for member in members {
            self.memberships
                .entry(member.member_ref())
                .or_default()
                .push(Membership {
                    role: member.role.clone(),
                    route: Arc::clone(&info),
                });
        }
        Some(info)
    }

    /// Close the relation pass
    pub fn build(self) -> RouteCache {
        debug!(
            relations_seen = self.seen,
            routes = self.routes.len(),
            members = self.memberships.len(),
            "route cache built"
        );
        RouteCache {
            routes: self.routes,
            memberships: self.memberships,
        }
    }
}

/// Immutable route attributes, keyed by relation id and by member
#[derive(Debug, Default)]
pub struct RouteCache {
    routes: FxHashMap<i64, Arc<RouteInfo>>,
    memberships: FxHashMap<MemberRef, Vec<Membership>>,
}

impl RouteCache {
    pub fn get(&self, relation_id: i64) -> Option<&RouteInfo> {
        self.routes.get(&relation_id).map(Arc::as_ref)
    }

    /// Routes `member` belongs to, in registration order
    pub fn memberships(&self, member: MemberRef) -> &[Membership] {
        self.memberships
            .get(&member)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn routes_for(&self, member: MemberRef) -> impl Iterator<Item = &RouteInfo> {
        self.memberships(member).iter().map(|m| m.route.as_ref())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
