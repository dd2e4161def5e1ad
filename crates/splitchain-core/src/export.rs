//! Presentational derivations of ledger data: CSV, invite links and payment URIs.

use uuid::Uuid;

use splitchain_domain::{Address, Expense, Group};

use crate::format::DateFormatter;

/// Renders a group's expenses as CSV with one amount column per member.
///
/// Columns: `Date,Description,Amount,Paid By,Split Type` followed by each
/// member's display name. Members without a split on an expense get `0`.
pub fn export_csv(group: &Group, expenses: &[Expense], dates: &dyn DateFormatter) -> String {
    let mut header = vec![
        "Date".to_string(),
        "Description".to_string(),
        "Amount".to_string(),
        "Paid By".to_string(),
        "Split Type".to_string(),
    ];
    header.extend(
        group
            .members
            .iter()
            .map(|member| csv_field(&group.display_name(&member.address))),
    );

    let mut lines = vec![header.join(",")];
    for expense in expenses {
        let mut row = vec![
            csv_field(&dates.format_date(expense.date)),
            quoted(&expense.description),
            expense.amount.to_string(),
            csv_field(&group.display_name(&expense.paid_by)),
            expense.split_type.to_string(),
        ];
        row.extend(group.members.iter().map(|member| {
            expense
                .split_for(&member.address)
                .map(|split| split.amount.to_string())
                .unwrap_or_else(|| "0".to_string())
        }));
        lines.push(row.join(","));
    }
    lines.join("\n")
}

/// Link a new member follows to join `group_id`.
pub fn invite_link(base_url: &str, group_id: Uuid) -> String {
    format!("{}/invite?groupId={}", base_url.trim_end_matches('/'), group_id)
}

/// EIP-681 style token transfer request encoded in payment QR codes.
pub fn payment_uri(token_contract: &str, to: &Address, amount: f64) -> String {
    format!(
        "ethereum:{}/transfer?address={}&uint256={}",
        token_contract,
        to,
        amount.abs()
    )
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use splitchain_domain::{Member, Split, SplitType};

    use super::*;
    use crate::format::ShortDateFormatter;

    #[test]
    fn csv_lists_member_columns() {
        let group = Group::new(
            "Trip",
            vec![
                Member::new("0xa", "Alex"),
                Member::new("0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65", ""),
            ],
        );
        let mut expense = Expense::new(
            group.id,
            Address::new("0xa"),
            40.0,
            "Fuel \"premium\"",
            Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap(),
            SplitType::Equal,
            vec![Split::new(Address::new("0xa"), 20.0, Some(50.0), true)],
        );
        expense.splits.push(Split::new(
            Address::new("0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65"),
            20.5,
            Some(50.0),
            false,
        ));

        let csv = export_csv(&group, &[expense], &ShortDateFormatter);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Date,Description,Amount,Paid By,Split Type,Alex,0x15d3...6a65"
        );
        assert_eq!(
            lines[1],
            "\"Feb 3, 2025\",\"Fuel \"\"premium\"\"\",40,Alex,equal,20,20.5"
        );
    }

    #[test]
    fn invite_link_trims_trailing_slash() {
        let id = Uuid::nil();
        assert_eq!(
            invite_link("https://splitchain.app/", id),
            "https://splitchain.app/invite?groupId=00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn payment_uri_uses_absolute_amount() {
        let uri = payment_uri("0xtoken", &Address::new("0xABC"), -12.5);
        assert_eq!(uri, "ethereum:0xtoken/transfer?address=0xabc&uint256=12.5");
    }
}
