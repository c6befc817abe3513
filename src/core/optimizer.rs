use std::collections::HashSet;

use tracing::debug;

use super::types::{Cents, FailureReason, OptimizerResult, OutstandingItem};

/// Picks the fewest outstanding expenses whose remaining balances add up to
/// `target_cents`, or to the largest total below it when no exact fit exists.
///
/// `items` must already be ordered oldest-first. Equal-size selections resolve
/// toward the items that appear earlier in that order.
pub fn optimize(items: &[OutstandingItem], target_cents: Cents) -> OptimizerResult {
    if target_cents <= 0 {
        return OptimizerResult::failure(
            FailureReason::NonPositiveTarget,
            "Target amount must be positive.",
        );
    }
    if items.is_empty() {
        return OptimizerResult::failure(
            FailureReason::NoOutstandingItems,
            "No outstanding expenses to reimburse.",
        );
    }
    if let Err(message) = validate_items(items) {
        return OptimizerResult::failure(FailureReason::InvalidItem, message);
    }

    let available = items
        .iter()
        .fold(0, |acc: Cents, item| acc.saturating_add(item.remaining_cents));
    if target_cents > available {
        return OptimizerResult::failure(
            FailureReason::TargetExceedsAvailable,
            format!(
                "Target of {target_cents} cents exceeds the {available} cents available across outstanding expenses."
            ),
        );
    }

    let Ok(target) = usize::try_from(target_cents) else {
        return OptimizerResult::failure(
            FailureReason::TargetExceedsAvailable,
            "Target amount is too large to search.",
        );
    };
    let amounts = items
        .iter()
        .map(|item| usize::try_from(item.remaining_cents).unwrap_or(usize::MAX))
        .collect::<Vec<_>>();

    debug!(items = items.len(), target_cents, "running reimbursement subset search");
    let table = SubsetTable::build(&amounts, target);

    let Some(best_sum) = table.best_sum_at_most(target) else {
        return OptimizerResult::failure(
            FailureReason::NoCombination,
            "No combination of outstanding expenses fits under the target.",
        );
    };

    let selection = table.selection(&amounts, best_sum);
    let total_cents = selection.iter().map(|&idx| items[idx].remaining_cents).sum();
    let exact_match = best_sum == target;
    let count = selection.len();
    let message = if exact_match {
        format!("Found an exact match using {count} expense(s).")
    } else {
        format!(
            "No exact match; closest total is {total_cents} cents using {count} expense(s), {} cents short.",
            target_cents - total_cents
        )
    };

    OptimizerResult {
        success: true,
        exact_match,
        selected_item_ids: selection
            .into_iter()
            .map(|idx| items[idx].id.clone())
            .collect(),
        total_cents,
        message,
        failure_reason: None,
    }
}

fn validate_items(items: &[OutstandingItem]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.remaining_cents <= 0 {
            return Err(format!(
                "Expense {} has no remaining balance and must not be offered for reimbursement.",
                item.id
            ));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(format!("Expense {} appears more than once.", item.id));
        }
    }
    Ok(())
}

/// 0/1 subset-sum table over totals `0..=target`.
///
/// `counts[s]` holds the fewest items reaching `s`. One bit row per item
/// records which totals that item improved, which is enough to walk the
/// winning selection back without storing index lists per total.
struct SubsetTable {
    counts: Vec<Option<u32>>,
    taken: Vec<u64>,
    words_per_row: usize,
}

impl SubsetTable {
    fn build(amounts: &[usize], target: usize) -> Self {
        let width = target + 1;
        let words_per_row = width.div_ceil(64);
        let mut counts = vec![None; width];
        counts[0] = Some(0);
        let mut taken = vec![0u64; words_per_row * amounts.len()];

        for (idx, &amount) in amounts.iter().enumerate() {
            if amount == 0 || amount > target {
                continue;
            }
            let row = idx * words_per_row;
            // High to low so each item lands at most once per total.
            for sum in (amount..=target).rev() {
                let Some(prev) = counts[sum - amount] else {
                    continue;
                };
                let candidate = prev + 1;
                // Strict: an equal count found later never displaces an older selection.
                if counts[sum].is_none_or(|best| candidate < best) {
                    counts[sum] = Some(candidate);
                    taken[row + sum / 64] |= 1u64 << (sum % 64);
                }
            }
        }

        Self {
            counts,
            taken,
            words_per_row,
        }
    }

    fn best_sum_at_most(&self, target: usize) -> Option<usize> {
        (1..=target).rev().find(|&sum| self.counts[sum].is_some())
    }

    fn is_taken(&self, idx: usize, sum: usize) -> bool {
        self.taken[idx * self.words_per_row + sum / 64] & (1u64 << (sum % 64)) != 0
    }

    /// Indices in input order.
    fn selection(&self, amounts: &[usize], sum: usize) -> Vec<usize> {
        let mut remaining = sum;
        let mut picked = Vec::new();
        for idx in (0..amounts.len()).rev() {
            if remaining == 0 {
                break;
            }
            if self.is_taken(idx, remaining) {
                picked.push(idx);
                remaining -= amounts[idx];
            }
        }
        picked.reverse();
        picked
    }
}
