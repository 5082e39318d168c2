//! Query filter pipeline over the current version of every patient.
//!
//! Each supplied predicate is an independent narrowing pass over the candidate list, applied as
//! a fold. Predicates are conjunctive; with none supplied every current version is returned.

use crate::error::{PatientError, PatientResult};
use crate::store::{RecordStore, RecordVersion};
use chrono::NaiveDate;
use fhir::{DateParam, ParamPrefix, Patient};

/// Repeated name-like fields that support exact (case-insensitive) matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringField {
    /// `name[].family`
    Family,
    /// `name[].given[]`
    Given,
}

/// Date-valued fields that support prefixed comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateField {
    /// `birthDate`
    BirthDate,
}

/// Supported date comparisons, all at calendar-day granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateComparator {
    #[default]
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
}

impl DateComparator {
    /// Whether a field value on day `field` satisfies the comparison against `reference`.
    pub fn matches(self, field: NaiveDate, reference: NaiveDate) -> bool {
        match self {
            DateComparator::Equal => field == reference,
            DateComparator::NotEqual => field != reference,
            DateComparator::GreaterThan => field > reference,
            DateComparator::GreaterThanOrEquals => field >= reference,
            DateComparator::LessThan => field < reference,
            DateComparator::LessThanOrEquals => field <= reference,
        }
    }

    /// Maps an optional wire prefix onto a comparator; no prefix means [`DateComparator::Equal`].
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidRequest`] for `sa`, `eb` and `ap`, which are not supported.
    pub fn from_prefix(prefix: Option<ParamPrefix>) -> PatientResult<Self> {
        prefix.map_or(Ok(DateComparator::Equal), DateComparator::try_from)
    }
}

impl TryFrom<ParamPrefix> for DateComparator {
    type Error = PatientError;

    fn try_from(prefix: ParamPrefix) -> Result<Self, Self::Error> {
        match prefix {
            ParamPrefix::Equal => Ok(DateComparator::Equal),
            ParamPrefix::NotEqual => Ok(DateComparator::NotEqual),
            ParamPrefix::GreaterThan => Ok(DateComparator::GreaterThan),
            ParamPrefix::GreaterThanOrEquals => Ok(DateComparator::GreaterThanOrEquals),
            ParamPrefix::LessThan => Ok(DateComparator::LessThan),
            ParamPrefix::LessThanOrEquals => Ok(DateComparator::LessThanOrEquals),
            ParamPrefix::StartsAfter | ParamPrefix::EndsBefore | ParamPrefix::Approximate => {
                Err(PatientError::InvalidRequest(format!(
                    "date search prefix '{prefix}' is not supported"
                )))
            }
        }
    }
}

/// One search constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchPredicate {
    /// Any element of `field` equals `value`, ignoring case.
    Exact { field: StringField, value: String },
    /// The record's `field` compares to `reference` by `comparator`. Absent dates never match.
    Date {
        field: DateField,
        comparator: DateComparator,
        reference: NaiveDate,
    },
}

impl SearchPredicate {
    pub fn matches(&self, patient: &Patient) -> bool {
        match self {
            SearchPredicate::Exact {
                field: StringField::Family,
                value,
            } => patient.name.iter().any(|name| {
                name.family
                    .as_deref()
                    .is_some_and(|family| equals_ignore_case(family, value))
            }),
            SearchPredicate::Exact {
                field: StringField::Given,
                value,
            } => patient.name.iter().any(|name| {
                name.given
                    .iter()
                    .any(|given| equals_ignore_case(given, value))
            }),
            SearchPredicate::Date {
                field: DateField::BirthDate,
                comparator,
                reference,
            } => patient
                .birth_date
                .is_some_and(|birth_date| comparator.matches(birth_date, *reference)),
        }
    }
}

fn equals_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// A set of optional predicates: any number of exact-match filters and at most one date filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParameters {
    exact: Vec<(StringField, String)>,
    date: Option<(DateField, DateComparator, NaiveDate)>,
}

impl SearchParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(self, family: impl Into<String>) -> Self {
        self.exact(StringField::Family, family)
    }

    pub fn given(self, given: impl Into<String>) -> Self {
        self.exact(StringField::Given, given)
    }

    pub fn exact(mut self, field: StringField, value: impl Into<String>) -> Self {
        self.exact.push((field, value.into()));
        self
    }

    /// Sets the birth-date filter, replacing any earlier date filter.
    pub fn birth_date(mut self, comparator: DateComparator, reference: NaiveDate) -> Self {
        self.date = Some((DateField::BirthDate, comparator, reference));
        self
    }

    /// Sets the birth-date filter from a parsed wire value.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidRequest`] if the prefix is not supported.
    pub fn birth_date_param(self, param: &DateParam) -> PatientResult<Self> {
        let comparator = DateComparator::from_prefix(param.prefix())?;
        Ok(self.birth_date(comparator, param.value()))
    }

    /// The supplied predicates, exact-match filters first.
    pub fn predicates(&self) -> Vec<SearchPredicate> {
        self.exact
            .iter()
            .map(|(field, value)| SearchPredicate::Exact {
                field: *field,
                value: value.clone(),
            })
            .chain(
                self.date
                    .map(|(field, comparator, reference)| SearchPredicate::Date {
                        field,
                        comparator,
                        reference,
                    }),
            )
            .collect()
    }
}

/// Current versions of every stored patient that satisfy all of `params`, in store order.
pub fn search(
    store: &RecordStore<Patient>,
    params: &SearchParameters,
) -> Vec<RecordVersion<Patient>> {
    params
        .predicates()
        .iter()
        .fold(store.current_versions(), |mut candidates, predicate| {
            candidates.retain(|version| predicate.matches(version.record()));
            candidates
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LogicalId;
    use fhir::HumanName;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn patient(family: &str, given: &[&str], birth_date: Option<NaiveDate>) -> Patient {
        Patient {
            name: vec![HumanName::new(family, given.iter().copied())],
            birth_date,
            ..Patient::default()
        }
    }

    fn ids(results: &[RecordVersion<Patient>]) -> Vec<u64> {
        results.iter().map(|v| v.logical_id().value()).collect()
    }

    /// Store with ids 1..=3: Smith 2000-07-28, Jones 2000-08-28, Smith (no birth date).
    fn sample_store() -> RecordStore<Patient> {
        let store = RecordStore::new(LogicalId::new(1));
        for record in [
            patient("Smith", &["Ann"], Some(day(2000, 7, 28))),
            patient("Jones", &["Bob", "Carl"], Some(day(2000, 8, 28))),
            patient("Smith", &["Dee"], None),
        ] {
            store.create(record).expect("create");
        }
        store
    }

    #[test]
    fn empty_parameters_return_every_current_version() {
        let empty: RecordStore<Patient> = RecordStore::new(LogicalId::new(1));
        assert!(search(&empty, &SearchParameters::new()).is_empty());

        let store = sample_store();
        store
            .update(LogicalId::new(1), patient("Smith-Jones", &["Ann"], None))
            .expect("update should succeed");

        let results = search(&store, &SearchParameters::new());
        assert_eq!(ids(&results), vec![1, 2, 3]);
        assert_eq!(results[0].version_label(), "1");
    }

    #[test]
    fn family_matches_case_insensitively() {
        let store = sample_store();
        let results = search(&store, &SearchParameters::new().family("sMiTh"));
        assert_eq!(ids(&results), vec![1, 3]);
    }

    #[test]
    fn given_matches_any_given_name() {
        let store = sample_store();
        let results = search(&store, &SearchParameters::new().given("carl"));
        assert_eq!(ids(&results), vec![2]);
    }

    #[test]
    fn family_matches_any_name_entry() {
        let store = RecordStore::new(LogicalId::new(1));
        store.create(Patient {
            name: vec![
                HumanName::new("Smith", ["Ann"]),
                HumanName::new("Jones", ["Ann"]),
            ],
            ..Patient::default()
        })
        .expect("create");

        assert_eq!(search(&store, &SearchParameters::new().family("jones")).len(), 1);
    }

    #[test]
    fn search_only_sees_current_versions() {
        let store = sample_store();
        store
            .update(LogicalId::new(2), patient("Brown", &["Bob"], None))
            .expect("update should succeed");

        assert!(search(&store, &SearchParameters::new().family("Jones")).is_empty());
        assert_eq!(
            ids(&search(&store, &SearchParameters::new().family("Brown"))),
            vec![2]
        );
    }

    #[test]
    fn date_comparators_follow_calendar_days() {
        let store = sample_store();
        let reference = day(2000, 7, 28);
        let cases = [
            (DateComparator::Equal, vec![1]),
            (DateComparator::NotEqual, vec![2]),
            (DateComparator::GreaterThan, vec![2]),
            (DateComparator::GreaterThanOrEquals, vec![1, 2]),
            (DateComparator::LessThan, vec![]),
            (DateComparator::LessThanOrEquals, vec![1]),
        ];

        for (comparator, expected) in cases {
            let params = SearchParameters::new().birth_date(comparator, reference);
            assert_eq!(ids(&search(&store, &params)), expected, "{comparator:?}");
        }
    }

    #[test]
    fn records_without_birth_date_never_match_a_date_predicate() {
        let store = sample_store();
        let params =
            SearchParameters::new().birth_date(DateComparator::NotEqual, day(1900, 1, 1));
        assert_eq!(ids(&search(&store, &params)), vec![1, 2]);
    }

    #[test]
    fn predicates_are_conjunctive() {
        let store = sample_store();
        let by_family = SearchParameters::new().family("Smith");
        let by_date =
            SearchParameters::new().birth_date(DateComparator::Equal, day(2000, 7, 28));
        let both = SearchParameters::new()
            .family("Smith")
            .birth_date(DateComparator::Equal, day(2000, 7, 28));

        let combined = ids(&search(&store, &both));
        assert_eq!(combined, vec![1]);
        for id in &combined {
            assert!(ids(&search(&store, &by_family)).contains(id));
            assert!(ids(&search(&store, &by_date)).contains(id));
        }
    }

    #[test]
    fn repeated_search_is_stable() {
        let store = sample_store();
        let params = SearchParameters::new().birth_date(DateComparator::Equal, day(2000, 8, 28));
        assert_eq!(search(&store, &params), search(&store, &params));
    }

    #[test]
    fn later_date_filter_replaces_earlier_one() {
        let params = SearchParameters::new()
            .birth_date(DateComparator::LessThan, day(2000, 1, 1))
            .birth_date(DateComparator::GreaterThan, day(2000, 1, 1));
        assert_eq!(params.predicates().len(), 1);
        assert!(matches!(
            params.predicates()[0],
            SearchPredicate::Date {
                comparator: DateComparator::GreaterThan,
                ..
            }
        ));
    }

    #[test]
    fn unsupported_prefixes_are_rejected() {
        for prefix in [
            ParamPrefix::StartsAfter,
            ParamPrefix::EndsBefore,
            ParamPrefix::Approximate,
        ] {
            let param = DateParam::new(Some(prefix), day(2000, 7, 28));
            assert!(matches!(
                SearchParameters::new().birth_date_param(&param),
                Err(PatientError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn missing_prefix_means_equal() {
        let param = DateParam::new(None, day(2000, 7, 28));
        let params = SearchParameters::new()
            .birth_date_param(&param)
            .expect("bare date is supported");
        assert_eq!(
            params,
            SearchParameters::new().birth_date(DateComparator::Equal, day(2000, 7, 28))
        );
    }
}
