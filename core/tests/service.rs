//! The command surface: response shapes and error kinds as a transport sees them.

mod common;

use common::{fixture, money};
use emi_ledger_core::LedgerCommand;
use rust_decimal_macros::dec;
use serde_json::json;

#[test]
fn record_payment_returns_message_payment_and_balance() {
    let fx = fixture(&[("ACC100", dec!(5000))]);

    let response = fx.service.handle_line(
        r#"{"type":"record_payment","account_number":"ACC100","amount":2000}"#,
    );

    assert_eq!(response["message"], "Payment recorded successfully");
    assert_eq!(money(&response["new_balance"]), dec!(3000));
    assert_eq!(response["payment"]["customer_account_number"], "ACC100");
    assert_eq!(response["payment"]["status"], "SUCCESS");
    assert_eq!(money(&response["payment"]["payment_amount"]), dec!(2000));
    assert!(response["payment"]["id"].is_i64());
}

#[test]
fn string_amounts_are_accepted() {
    let fx = fixture(&[("ACC100", dec!(5000))]);
    let response = fx.service.handle_line(
        r#"{"type":"record_payment","account_number":"ACC100","amount":"1250.75"}"#,
    );
    assert_eq!(money(&response["new_balance"]), dec!(3749.25));
}

#[test]
fn each_failure_has_a_distinct_kind() {
    let fx = fixture(&[("ACC100", dec!(5000))]);

    let cases = [
        (r#"{"type":"record_payment","amount":100}"#, "invalid_argument"),
        (r#"{"type":"record_payment","account_number":"","amount":100}"#, "invalid_argument"),
        (r#"{"type":"record_payment","account_number":"ACC100"}"#, "invalid_argument"),
        (r#"{"type":"record_payment","account_number":"ACC100","amount":"ten"}"#, "invalid_argument"),
        (r#"{"type":"record_payment","account_number":"UNKNOWN","amount":100}"#, "not_found"),
        (r#"{"type":"get_account","account_number":"UNKNOWN"}"#, "not_found"),
        (r#"{"type":"launch_rockets"}"#, "invalid_argument"),
        ("not json at all", "invalid_argument"),
    ];
    for (line, kind) in cases {
        let response = fx.service.handle_line(line);
        assert_eq!(response["error"]["kind"], kind, "request: {line}");
        assert!(response["error"]["message"].is_string());
    }

    assert_eq!(fx.store().payment_count().unwrap(), 0);
    assert_eq!(fx.due("ACC100"), dec!(5000));
}

#[test]
fn storage_failures_map_to_storage_error() {
    let fx = fixture(&[("ACC100", dec!(5000))]);
    fx.store().close().unwrap();
    let response = fx.service.handle_line(r#"{"type":"list_accounts"}"#);
    assert_eq!(response["error"]["kind"], "storage_error");
}

#[test]
fn read_commands_return_json_collections() {
    let fx = fixture(&[("ACC1", dec!(900)), ("ACC2", dec!(100))]);
    fx.service
        .execute(LedgerCommand::RecordPayment {
            account_number: Some("ACC1".into()),
            amount: Some(json!(400)),
        })
        .unwrap();

    let accounts = fx.service.execute(LedgerCommand::ListAccounts).unwrap();
    assert_eq!(accounts.as_array().map(Vec::len), Some(2));

    let payments = fx.service.execute(LedgerCommand::ListPayments).unwrap();
    assert_eq!(payments.as_array().map(Vec::len), Some(1));

    let history = fx
        .service
        .execute(LedgerCommand::ListPaymentsForAccount {
            account_number: "ACC2".into(),
        })
        .unwrap();
    assert_eq!(history, json!([]));

    let analytics = fx.service.execute(LedgerCommand::GetAnalytics).unwrap();
    assert_eq!(money(&analytics["collected_today"]), dec!(400));
    assert_eq!(money(&analytics["pending_total"]), dec!(600));
}
