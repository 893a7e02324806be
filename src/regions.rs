use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::GeoAdjError;

/// A U.S. state (or DC / Puerto Rico) with its two-digit FIPS code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    pub abbr: &'static str,
    pub name: &'static str,
    pub fips: &'static str,
}

impl State {
    pub fn abbr_lower(&self) -> String {
        self.abbr.to_ascii_lowercase()
    }

    pub fn all() -> &'static [State] {
        STATES
    }

    /// Resolve a state by abbreviation, full name or FIPS code, ignoring case.
    pub fn lookup(key: &str) -> Result<&'static State, GeoAdjError> {
        STATE_INDEX
            .get(key.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| GeoAdjError::UnknownState(key.to_string()))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const fn state(abbr: &'static str, name: &'static str, fips: &'static str) -> State {
    State { abbr, name, fips }
}

static STATES: &[State] = &[
    state("AL", "Alabama", "01"),
    state("AK", "Alaska", "02"),
    state("AZ", "Arizona", "04"),
    state("AR", "Arkansas", "05"),
    state("CA", "California", "06"),
    state("CO", "Colorado", "08"),
    state("CT", "Connecticut", "09"),
    state("DE", "Delaware", "10"),
    state("DC", "District of Columbia", "11"),
    state("FL", "Florida", "12"),
    state("GA", "Georgia", "13"),
    state("HI", "Hawaii", "15"),
    state("ID", "Idaho", "16"),
    state("IL", "Illinois", "17"),
    state("IN", "Indiana", "18"),
    state("IA", "Iowa", "19"),
    state("KS", "Kansas", "20"),
    state("KY", "Kentucky", "21"),
    state("LA", "Louisiana", "22"),
    state("ME", "Maine", "23"),
    state("MD", "Maryland", "24"),
    state("MA", "Massachusetts", "25"),
    state("MI", "Michigan", "26"),
    state("MN", "Minnesota", "27"),
    state("MS", "Mississippi", "28"),
    state("MO", "Missouri", "29"),
    state("MT", "Montana", "30"),
    state("NE", "Nebraska", "31"),
    state("NV", "Nevada", "32"),
    state("NH", "New Hampshire", "33"),
    state("NJ", "New Jersey", "34"),
    state("NM", "New Mexico", "35"),
    state("NY", "New York", "36"),
    state("NC", "North Carolina", "37"),
    state("ND", "North Dakota", "38"),
    state("OH", "Ohio", "39"),
    state("OK", "Oklahoma", "40"),
    state("OR", "Oregon", "41"),
    state("PA", "Pennsylvania", "42"),
    state("RI", "Rhode Island", "44"),
    state("SC", "South Carolina", "45"),
    state("SD", "South Dakota", "46"),
    state("TN", "Tennessee", "47"),
    state("TX", "Texas", "48"),
    state("UT", "Utah", "49"),
    state("VT", "Vermont", "50"),
    state("VA", "Virginia", "51"),
    state("WA", "Washington", "53"),
    state("WV", "West Virginia", "54"),
    state("WI", "Wisconsin", "55"),
    state("WY", "Wyoming", "56"),
    state("PR", "Puerto Rico", "72"),
];

static STATE_INDEX: Lazy<IndexMap<String, &'static State>> = Lazy::new(|| {
    let mut index = IndexMap::with_capacity(STATES.len() * 3);
    for state in STATES {
        index.insert(state.abbr.to_ascii_lowercase(), state);
        index.insert(state.name.to_ascii_lowercase(), state);
        index.insert(state.fips.to_string(), state);
    }
    index
});

/// Census geography level a graph was built at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geography {
    County,
    Tract,
    Block,
    BlockGroup,
    Vtd,
}

impl Geography {
    pub const ALL: [Geography; 5] = [
        Geography::County,
        Geography::Tract,
        Geography::Block,
        Geography::BlockGroup,
        Geography::Vtd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Geography::County => "county",
            Geography::Tract => "tract",
            Geography::Block => "block",
            Geography::BlockGroup => "blockgroup",
            Geography::Vtd => "vtd",
        }
    }

    /// Prefix used by adjacency graph file names.
    pub fn graph_code(&self) -> &'static str {
        match self {
            Geography::County => "cnty",
            Geography::Tract => "t",
            Geography::Block => "b",
            Geography::BlockGroup => "bg",
            Geography::Vtd => "vtd",
        }
    }

    /// Suffix used by the TIGER/Line 2020 shapefile names.
    pub fn shapefile_code(&self) -> &'static str {
        match self {
            Geography::County => "county20",
            Geography::Tract => "tract",
            Geography::Block => "tabblock20",
            Geography::BlockGroup => "bg",
            Geography::Vtd => "vtd20",
        }
    }

    /// Stem of the TIGER/Line 2020 layer this geography joins onto for `state`.
    pub fn shapefile_stem(&self, state: &State) -> String {
        format!("tl_2020_{}_{}", state.fips, self.shapefile_code())
    }

    pub fn title(&self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Geography {
    type Err = GeoAdjError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Geography::ALL
            .into_iter()
            .find(|geog| geog.name() == key || geog.graph_code() == key)
            .ok_or_else(|| GeoAdjError::UnknownGeography(s.to_string()))
    }
}
