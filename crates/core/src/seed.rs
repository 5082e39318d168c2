//! Demo patient generator.
//!
//! Seeds the store at startup so a fresh server has something to read and search. Patients go
//! through [`PatientService::create`], the same path as client-created ones, so each one gets the
//! next logical id and version `"0"`. Every field is derived from that id.

use crate::constants::DEMO_ORGANIZATION_ID;
use crate::error::{PatientError, PatientResult};
use crate::patient::PatientService;
use chrono::{Months, NaiveDate};
use fhir::{AdministrativeGender, HumanName, IdType, Identifier, Patient, Reference};

const GYM_MEMBER_SYSTEM: &str = "http://gyms.are.us.com/gyms.are.us.memberid";
const LIBRARY_MEMBER_SYSTEM: &str = "http://libraries.are.cool.com/libraries.are.cool.memberid";

/// Creates `count` demo patients and returns their ids.
///
/// # Errors
///
/// Returns `PatientError` if the store runs out of identities, a derived birth date is out of
/// range, or a create fails.
pub fn seed_demo_patients(service: &PatientService, count: usize) -> PatientResult<Vec<IdType>> {
    (0..count)
        .map(|_| {
            let next_id = service.store().next_id().ok_or_else(|| {
                PatientError::InvalidInput("no logical ids left for demo patients".into())
            })?;
            service.create(demo_patient(next_id.value())?)
        })
        .collect()
}

/// Builds the demo patient that will be stored under logical id `n`.
///
/// Birth dates are 2000-07-28 plus `n` months.
pub fn demo_patient(n: u64) -> PatientResult<Patient> {
    let family = match n % 3 {
        0 => "Patel",
        1 => "Jones",
        _ => "Smith",
    };

    let mut given = vec![
        format!("MyFirstName{n}"),
        format!("MyMiddleOneName{n}"),
        format!("MyMiddleTwoName{n}"),
    ];
    let gender = if n % 2 == 0 {
        given.push(if n % 4 == 0 { "Fatima" } else { "Mary" }.to_string());
        AdministrativeGender::Female
    } else {
        given.push(if n % 4 == 1 { "John" } else { "Sri" }.to_string());
        AdministrativeGender::Male
    };

    let birth_date = u32::try_from(n)
        .ok()
        .zip(NaiveDate::from_ymd_opt(2000, 7, 28))
        .and_then(|(months, reference)| reference.checked_add_months(Months::new(months)))
        .ok_or_else(|| {
            PatientError::InvalidInput(format!("demo birth date out of range for id {n}"))
        })?;

    Ok(Patient {
        identifier: vec![
            Identifier::new(GYM_MEMBER_SYSTEM, format!("GYMS.R.US...{n}")),
            Identifier::new(LIBRARY_MEMBER_SYSTEM, format!("LIB.R.COOL...{n}")),
        ],
        name: vec![HumanName::new(family, given)],
        gender: Some(gender),
        birth_date: Some(birth_date),
        managing_organization: Some(Reference::new(format!(
            "Organization/{DEMO_ORGANIZATION_ID}"
        ))),
        ..Patient::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{DateComparator, SearchParameters};
    use crate::store::{LogicalId, RecordStore};
    use std::sync::Arc;

    #[test]
    fn demo_patient_fields_follow_id() {
        let p = demo_patient(52).expect("demo patient");
        let name = &p.name[0];
        assert_eq!(name.family.as_deref(), Some("Jones"));
        assert_eq!(
            name.given,
            vec![
                "MyFirstName52",
                "MyMiddleOneName52",
                "MyMiddleTwoName52",
                "Fatima"
            ]
        );
        assert_eq!(p.gender, Some(AdministrativeGender::Female));
        assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(2004, 11, 28));
        assert_eq!(p.identifier[0].value.as_deref(), Some("GYMS.R.US...52"));
        assert_eq!(
            p.managing_organization,
            Some(Reference::new("Organization/1"))
        );

        let p = demo_patient(51).expect("demo patient");
        assert_eq!(p.name[0].family.as_deref(), Some("Patel"));
        assert_eq!(p.name[0].given.last().map(String::as_str), Some("Sri"));
        assert_eq!(p.gender, Some(AdministrativeGender::Male));
    }

    #[test]
    fn seeding_uses_the_store_counter() {
        let service = PatientService::new(Arc::new(RecordStore::new(LogicalId::new(51))));
        let ids = seed_demo_patients(&service, 10).expect("seed");

        let numeric: Vec<_> = ids.iter().map(|id| id.id_part().to_string()).collect();
        assert_eq!(numeric.first().map(String::as_str), Some("51"));
        assert_eq!(numeric.last().map(String::as_str), Some("60"));
        assert!(ids.iter().all(|id| id.version_id_part() == Some("0")));

        let seeded = service
            .read(&IdType::new("55", None))
            .expect("seeded patient readable");
        assert_eq!(seeded.name[0].given[0], "MyFirstName55");
    }

    #[test]
    fn seeding_near_the_top_of_the_id_space_is_an_error() {
        let service =
            PatientService::new(Arc::new(RecordStore::new(LogicalId::new(u64::MAX - 1))));
        let err = seed_demo_patients(&service, 3).expect_err("only two ids remain");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn seeded_patients_are_searchable() {
        let service = PatientService::new(Arc::new(RecordStore::new(LogicalId::new(51))));
        seed_demo_patients(&service, 10).expect("seed");

        // 51..=60 born 2004-10-28 onwards, one month apart.
        let born_2005_or_later = SearchParameters::new().birth_date(
            DateComparator::GreaterThanOrEquals,
            NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
        );
        assert_eq!(service.search(&born_2005_or_later).len(), 7);
        assert_eq!(service.search(&SearchParameters::new().given("fatima")).len(), 3);
    }
}
