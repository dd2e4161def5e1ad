use std::collections::HashMap;

use proptest::prelude::*;
use splitchain_core::{BalanceService, SplitService};
use splitchain_domain::{Address, Expense, Group, Member, SplitType};

fn members(count: usize) -> Vec<Member> {
    (0..count)
        .map(|idx| Member::new(format!("0x{:040x}", idx + 1), format!("Member {}", idx + 1)))
        .collect()
}

proptest! {
    #[test]
    fn equal_splits_sum_to_amount(
        member_count in 1usize..=12,
        cents in 1u64..=10_000_000,
    ) {
        let amount = cents as f64 / 100.0;
        let members = members(member_count);
        let payer = members[0].address.clone();

        let splits = SplitService::compute(amount, SplitType::Equal, &payer, &members, None)
            .expect("equal split");
        let total: f64 = splits.iter().map(|split| split.amount).sum();

        prop_assert_eq!(splits.len(), member_count);
        prop_assert!((total - amount).abs() < 1e-6 * member_count as f64);
        prop_assert_eq!(splits.iter().filter(|split| split.paid).count(), 1);
    }

    #[test]
    fn percentage_splits_sum_to_amount(
        raw in prop::collection::vec(1u32..=1_000, 1..=8),
        cents in 1u64..=10_000_000,
    ) {
        let amount = cents as f64 / 100.0;
        let members = members(raw.len());
        let raw_total: u32 = raw.iter().sum();
        let weights: HashMap<Address, f64> = members
            .iter()
            .zip(&raw)
            .map(|(member, share)| (member.address.clone(), *share as f64 * 100.0 / raw_total as f64))
            .collect();
        let payer = members[0].address.clone();

        let splits = SplitService::compute(amount, SplitType::Percentage, &payer, &members, Some(&weights))
            .expect("percentage split");
        let total: f64 = splits.iter().map(|split| split.amount).sum();

        prop_assert!((total - amount).abs() < 0.01);
    }

    #[test]
    fn balances_sum_to_zero_without_settlements(
        member_count in 2usize..=6,
        expenses in prop::collection::vec((0usize..6, 1u64..=100_000), 0..=20),
    ) {
        let members = members(member_count);
        let group = Group::new("Property", members.clone());
        let mut history = Vec::new();
        for (payer_idx, cents) in expenses {
            let payer = members[payer_idx % member_count].address.clone();
            let amount = cents as f64 / 100.0;
            let mut splits = SplitService::compute(amount, SplitType::Equal, &payer, &members, None)
                .expect("equal split");
            for split in &mut splits {
                split.paid = false;
            }
            history.push(Expense::new(
                group.id,
                payer,
                amount,
                "generated",
                chrono::Utc::now(),
                SplitType::Equal,
                splits,
            ));
        }

        let balances = BalanceService::compute(&group, &history);
        prop_assert!(BalanceService::total(&balances).abs() < 1e-6 * (history.len() as f64 + 1.0));
    }

    #[test]
    fn settling_one_split_moves_only_that_member(
        member_count in 2usize..=6,
        cents in 1u64..=100_000,
        target in 1usize..6,
    ) {
        let members = members(member_count);
        let group = Group::new("Property", members.clone());
        let payer = members[0].address.clone();
        let amount = cents as f64 / 100.0;
        let splits = SplitService::compute(amount, SplitType::Equal, &payer, &members, None)
            .expect("equal split");
        let mut expense = Expense::new(
            group.id,
            payer,
            amount,
            "generated",
            chrono::Utc::now(),
            SplitType::Equal,
            splits,
        );
        let before = BalanceService::compute(&group, std::slice::from_ref(&expense));

        let debtor = members[1 + (target - 1) % (member_count - 1)].address.clone();
        let share = expense.split_for(&debtor).expect("split").amount;
        expense.split_for_mut(&debtor).expect("split").mark_paid("0xproof");
        let after = BalanceService::compute(&group, &[expense]);

        for member in &members {
            let delta = after[&member.address] - before[&member.address];
            if member.address == debtor {
                prop_assert!((delta - share).abs() < 1e-9);
            } else {
                prop_assert_eq!(delta, 0.0);
            }
        }
    }
}
