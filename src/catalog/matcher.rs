use super::{Catalog, ModelRecord};

/// Maximum number of records a recommendation contains.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Filters the catalog down to at most [`MAX_RECOMMENDATIONS`] records, in
/// catalog order. All comparisons are case-insensitive substring tests:
///
/// * some entry of `use_cases` contains `use_case`, or is contained by it
/// * `pricing` contains `budget`
/// * `specificity` contains `specificity`
pub fn match_models<'a>(
    catalog: &'a Catalog,
    use_case: &str,
    budget: &str,
    specificity: &str,
) -> Vec<&'a ModelRecord> {
    let use_case = use_case.to_lowercase();
    let budget = budget.to_lowercase();
    let specificity = specificity.to_lowercase();

    catalog
        .records()
        .iter()
        .filter(|record| {
            matches_use_case(record, &use_case)
                && record.pricing.to_lowercase().contains(&budget)
                && record.specificity.to_lowercase().contains(&specificity)
        })
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

fn matches_use_case(record: &ModelRecord, needle: &str) -> bool {
    record.use_cases.iter().any(|candidate| {
        let candidate = candidate.to_lowercase();
        candidate.contains(needle) || needle.contains(&candidate)
    })
}
