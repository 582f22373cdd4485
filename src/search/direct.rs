//! Direct predicates: criteria answered by the store query itself

use crate::core::store::{StorePredicate, StoreQuery};
use crate::search::request::DirectCriteria;

/// Exclusions applied to every search
///
/// Stores without an owner are admin placeholders and are never returned.
pub fn append_default_exclusions(query: &mut StoreQuery) {
    query
        .filter(StorePredicate::OwnerAssigned)
        .filter(StorePredicate::NotDeleted);
}

/// Append one predicate per present direct criterion
pub fn append_direct_predicates(query: &mut StoreQuery, criteria: &DirectCriteria) {
    if let Some(number) = criteria.number {
        query.filter(StorePredicate::NumberEquals(number));
    }
    if let Some(name) = &criteria.name {
        query.filter(StorePredicate::NameContains(name.clone()));
    }
    if let Some(status) = &criteria.status {
        query.filter(StorePredicate::StatusIn(status.clone()));
    }
    if let Some(plan) = &criteria.plan {
        query.filter(StorePredicate::PlanIn(plan.clone()));
    }
    if let Some(form) = &criteria.business_form {
        query.filter(StorePredicate::BusinessFormIn(form.clone()));
    }
    if let Some(guarantee) = criteria.guarantee {
        query.filter(StorePredicate::Guarantee(guarantee));
    }
    if criteria.margin_rate.is_active() {
        query.filter(StorePredicate::MarginRate(criteria.margin_rate));
    }
    if criteria.follower_count.is_active() {
        query.filter(StorePredicate::FollowerCount(criteria.follower_count));
    }
    if criteria.created_at.is_active() {
        query.filter(StorePredicate::CreatedAt(criteria.created_at));
    }

    // detail
    if let Some(company) = &criteria.company_name {
        query.filter(StorePredicate::CompanyNameContains(company.clone()));
    }
    if let Some(representative) = &criteria.representative_name {
        query.filter(StorePredicate::RepresentativeContains(representative.clone()));
    }
    if let Some(registration) = &criteria.registration_number {
        query.filter(StorePredicate::RegistrationNumberEquals(registration.clone()));
    }
    if let Some(methods) = &criteria.payment_method {
        query.filter(StorePredicate::PaymentMethodIn(methods.clone()));
    }

    // owner
    if let Some(display_id) = &criteria.owner_display_id {
        query.filter(StorePredicate::OwnerDisplayIdEquals(display_id.clone()));
    }
    if let Some(nickname) = &criteria.owner_nickname {
        query.filter(StorePredicate::OwnerNicknameContains(nickname.clone()));
    }
    if let Some(email) = &criteria.owner_email {
        query.filter(StorePredicate::OwnerEmailContains(email.clone()));
    }

    // payback
    if let Some(account) = &criteria.account_number {
        query.filter(StorePredicate::AccountNumberContains(account.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::range::RangeFilter;
    use crate::entities::{PaymentMethod, StoreStatus};

    #[test]
    fn test_no_criteria_adds_nothing() {
        let mut query = StoreQuery::new();
        append_direct_predicates(&mut query, &DirectCriteria::default());
        assert!(query.predicates.is_empty());
    }

    #[test]
    fn test_default_exclusions() {
        let mut query = StoreQuery::new();
        append_default_exclusions(&mut query);
        assert_eq!(
            query.predicates,
            vec![StorePredicate::OwnerAssigned, StorePredicate::NotDeleted]
        );
    }

    #[test]
    fn test_present_criteria_become_predicates() {
        let criteria = DirectCriteria {
            name: Some("tea".to_string()),
            status: Some(vec![StoreStatus::Active, StoreStatus::Suspended]),
            margin_rate: RangeFilter::classify(Some(5.0), None),
            payment_method: Some(vec![PaymentMethod::Invoice]),
            owner_display_id: Some("tea_master".to_string()),
            ..DirectCriteria::default()
        };

        let mut query = StoreQuery::new();
        append_direct_predicates(&mut query, &criteria);

        assert_eq!(
            query.predicates,
            vec![
                StorePredicate::NameContains("tea".to_string()),
                StorePredicate::StatusIn(vec![StoreStatus::Active, StoreStatus::Suspended]),
                StorePredicate::MarginRate(RangeFilter::FromOnly(5.0)),
                StorePredicate::PaymentMethodIn(vec![PaymentMethod::Invoice]),
                StorePredicate::OwnerDisplayIdEquals("tea_master".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_range_is_kept() {
        let criteria = DirectCriteria {
            follower_count: RangeFilter::classify(Some(0), Some(0)),
            ..DirectCriteria::default()
        };

        let mut query = StoreQuery::new();
        append_direct_predicates(&mut query, &criteria);
        assert_eq!(
            query.predicates,
            vec![StorePredicate::FollowerCount(RangeFilter::Both(0, 0))]
        );
    }
}
