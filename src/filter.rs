//! The filter engine: exact-match predicates over the in-memory flow
//! table. An unset field matches everything; an empty result is a valid
//! state that propagates to the renderers as "no data".

use crate::data::FlowRecord;
use crate::state::FilterSelection;

/// Whether the year predicate participates. The time-series view shows
/// all years while the other filters still apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearScope {
    Selected,
    AllYears,
}

pub fn apply_filters<'a>(
    rows: &'a [FlowRecord],
    sel: &FilterSelection,
    scope: YearScope,
) -> Vec<&'a FlowRecord> {
    rows.iter()
        .filter(|r| matches(r, sel, scope))
        .collect()
}

fn matches(r: &FlowRecord, sel: &FilterSelection, scope: YearScope) -> bool {
    if let Some(partner) = &sel.partner {
        if &r.partner_iso3 != partner {
            return false;
        }
    }
    if scope == YearScope::Selected {
        if let Some(year) = sel.year {
            if r.year != year {
                return false;
            }
        }
    }
    if let Some(product) = &sel.product {
        if &r.value_chain != product {
            return false;
        }
    }
    if let Some(temp) = &sel.temperature {
        if &r.temperature != temp {
            return false;
        }
    }
    true
}
