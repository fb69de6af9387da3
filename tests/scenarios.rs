mod common;

use common::{add_subscriber, june, open_manager, stock_catalog, temp_base, TestClock};
use dairy_config::Config;
use dairy_core::{BalanceStanding, DueSource};
use dairy_domain::{
    round2, BillingMonth, Customer, CustomerKind, ItemSpec, PaymentMode, PaymentType,
    RecordStatus, SameDaySlots, Schedule, SkipReason, SkippedDate, TimeSlot, WalkInContact,
};
use dairy_ledger::DairyManager;
use uuid::Uuid;

fn june_month() -> BillingMonth {
    BillingMonth::new(2024, 6).expect("valid month")
}

fn assert_ledger_sums(manager: &DairyManager) {
    for record in &manager.book().monthly_records {
        assert_eq!(
            record.balance_due,
            round2(record.previous_balance + record.current_month_total - record.total_paid),
            "balance invariant broken for {}",
            record.month
        );
    }
}

#[test]
fn subscriber_month_from_delivery_to_close() {
    let base = temp_base();
    let clock = TestClock::at(june(1), 7);
    let mut manager = open_manager(&base, &clock, Config::default());
    stock_catalog(&mut manager);
    let asha = add_subscriber(&mut manager, "Asha");

    // Delivered on account.
    let generated = manager.generate_today().expect("generate");
    assert_eq!(generated.len(), 1);
    assert!(manager.generate_today().expect("regenerate").is_empty());

    let settlement = manager.mark_delivered(generated[0]).expect("deliver");
    assert_eq!(settlement.total, 60.0);
    assert_eq!(settlement.paid_amount, 0.0);
    let sale = manager
        .book()
        .sale(settlement.sale_id)
        .expect("sale for delivery");
    assert_eq!(sale.delivery_id, Some(generated[0]));
    assert_eq!(sale.total_amount, 60.0);
    assert_eq!(sale.paid_amount, 0.0);
    assert_eq!(sale.payment_type, PaymentType::Due);

    let record = manager.statement(asha, june_month()).expect("june record");
    assert_eq!(record.current_month_total, 60.0);
    assert_eq!(record.total_due, 60.0);
    assert_eq!(record.total_paid, 0.0);
    assert_eq!(record.balance_due, 60.0);

    // Cash against the balance.
    manager
        .record_payment(asha, 40.0, PaymentMode::Cash, june(1), None)
        .expect("payment");
    let record = manager.statement(asha, june_month()).unwrap();
    assert_eq!(record.total_paid, 40.0);
    assert_eq!(record.balance_due, 20.0);

    // Nobody home the next morning.
    clock.set(june(2), 7);
    let next = manager.generate_today().expect("generate day 2");
    assert_eq!(next.len(), 1);
    let touched = manager
        .skip(next[0], SkipReason::GharPeNahi, Some("door locked".into()))
        .expect("skip");
    assert!(touched);
    let record = manager.statement(asha, june_month()).unwrap();
    assert_eq!(record.delivered_count, 1);
    assert_eq!(record.skipped_count, 1);
    assert_eq!(record.current_month_total, 60.0);
    assert_eq!(
        record.skipped_dates,
        vec![SkippedDate {
            date: june(2),
            reason: Some(SkipReason::GharPeNahi),
            note: None,
        }]
    );

    // Close June, July opens with the carried balance.
    let summary = manager.close_month(june_month()).expect("close");
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.opened, 1);
    let june_record = manager.statement(asha, june_month()).unwrap();
    assert_eq!(june_record.status, RecordStatus::Closed);
    let july = manager.statement(asha, june_month().next()).unwrap();
    assert_eq!(july.previous_balance, 20.0);
    assert_eq!(july.current_month_total, 0.0);
    assert_eq!(july.balance_due, 20.0);

    let due = manager.canonical_due(asha).expect("due");
    assert_eq!(due.source, DueSource::Ledger);
    assert_eq!(due.amount, 20.0);
    assert_eq!(BalanceStanding::of(due.amount), BalanceStanding::Due);
    assert_ledger_sums(&manager);
}

#[test]
fn walk_in_on_credit_becomes_a_random_customer() {
    let base = temp_base();
    let clock = TestClock::at(june(1), 9);
    let mut manager = open_manager(&base, &clock, Config::default());
    stock_catalog(&mut manager);

    let contact = WalkInContact {
        name: "Ravi".into(),
        phone: Some("9800000000".into()),
        address: Some("Lane 4".into()),
    };
    let delivery_id = manager
        .add_walk_in(contact, june(1), TimeSlot::Morning, &[ItemSpec::new("paneer", 1.0)])
        .expect("walk-in");

    let settlement = manager
        .submit_payment(delivery_id, PaymentType::Due, None)
        .expect("due payment");
    assert_eq!(settlement.total, 100.0);
    assert!(!settlement.ledger_updated);
    let promoted = settlement.promoted_customer.expect("walk-in promoted");

    let customer = manager.book().customer(promoted).expect("customer record");
    assert_eq!(customer.kind, CustomerKind::Random);
    assert_eq!(customer.name, "Ravi");
    assert_eq!(customer.phone.as_deref(), Some("9800000000"));
    assert_eq!(customer.address.as_deref(), Some("Lane 4"));
    assert!(manager.book().monthly_records.is_empty());

    assert_eq!(manager.customer_due(promoted), 100.0);
    let dues = manager.due_list();
    assert_eq!(dues.len(), 1);
    assert_eq!(dues[0].customer_id, promoted);
    assert_eq!(dues[0].source, DueSource::Sales);

    let today = manager.daily_stats(june(1));
    assert_eq!(today.new_dues, 100.0);
    assert_eq!(today.delivered, 1);
}

fn two_slot_customer() -> Customer {
    Customer::fixed("Meena")
        .with_schedule(Schedule::daily(vec![TimeSlot::Morning, TimeSlot::Evening]))
        .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)])
        .with_slot_items(TimeSlot::Evening, vec![ItemSpec::new("curd", 2.0)])
}

fn deliver_both_slots(manager: &mut DairyManager) -> Uuid {
    let meena = manager.add_customer(two_slot_customer()).expect("add customer");
    let generated = manager.generate_today().expect("generate");
    assert_eq!(generated.len(), 2);
    let slot_of = |manager: &DairyManager, id: Uuid| {
        manager.book().delivery(id).expect("delivery").time_slot
    };
    let (morning, evening) = if slot_of(manager, generated[0]) == TimeSlot::Morning {
        (generated[0], generated[1])
    } else {
        (generated[1], generated[0])
    };
    manager.mark_delivered(morning).expect("morning");
    manager.mark_delivered(evening).expect("evening");
    meena
}

#[test]
fn same_day_slots_collapse_to_the_last_written_detail() {
    let base = temp_base();
    let clock = TestClock::at(june(1), 18);
    let mut manager = open_manager(&base, &clock, Config::default());
    stock_catalog(&mut manager);
    assert_eq!(manager.policy(), SameDaySlots::LastWriteWins);

    let meena = deliver_both_slots(&mut manager);

    let record = manager.statement(meena, june_month()).unwrap();
    assert_eq!(record.delivery_details.len(), 1);
    assert_eq!(record.delivery_details[0].time_slot, TimeSlot::Evening);
    assert_eq!(record.delivered_count, 1);
    assert_eq!(record.current_month_total, 50.0);
    // Both sales exist even though the ledger keeps one line for the date.
    assert_eq!(manager.book().sales_for(meena).count(), 2);
    assert_ledger_sums(&manager);
}

#[test]
fn per_slot_policy_keeps_every_slot() {
    let base = temp_base();
    let clock = TestClock::at(june(1), 18);
    let config = Config {
        same_day_slots: SameDaySlots::PerSlot,
        ..Config::default()
    };
    let mut manager = open_manager(&base, &clock, config);
    stock_catalog(&mut manager);

    let meena = deliver_both_slots(&mut manager);

    let record = manager.statement(meena, june_month()).unwrap();
    assert_eq!(record.delivery_details.len(), 2);
    assert_eq!(record.delivered_count, 2);
    assert_eq!(record.current_month_total, 110.0);
    assert_eq!(record.balance_due, 110.0);
}

#[test]
fn started_pending_follows_the_clock() {
    let base = temp_base();
    let clock = TestClock::at(june(1), 7);
    let mut manager = open_manager(&base, &clock, Config::default());
    stock_catalog(&mut manager);
    manager.add_customer(two_slot_customer()).unwrap();
    manager.generate_today().unwrap();

    assert_eq!(manager.started_pending().len(), 1);
    clock.set(june(1), 17);
    assert_eq!(manager.started_pending().len(), 2);
    clock.set(june(1), 5);
    assert!(manager.started_pending().is_empty());
}

#[test]
fn generation_stays_idempotent_across_restarts() {
    let base = temp_base();
    let clock = TestClock::at(june(3), 7);
    {
        let mut manager = open_manager(&base, &clock, Config::default());
        stock_catalog(&mut manager);
        add_subscriber(&mut manager, "Asha");
        add_subscriber(&mut manager, "Kiran");
        assert_eq!(manager.generate_today().unwrap().len(), 2);
    }

    let reopened = open_manager(&base, &clock, Config::default());
    assert_eq!(reopened.book().deliveries.len(), 2);
    assert_eq!(reopened.book().deliveries_on(june(3)).count(), 2);

    // Next day's open generates the new day automatically.
    clock.set(june(4), 6);
    let next_day = open_manager(&base, &clock, Config::default());
    assert_eq!(next_day.book().deliveries_on(june(4)).count(), 2);
}

#[test]
fn payment_then_backdated_delivery_keeps_balances_consistent() {
    let base = temp_base();
    let clock = TestClock::at(june(10), 8);
    let mut manager = open_manager(&base, &clock, Config::default());
    stock_catalog(&mut manager);
    let asha = add_subscriber(&mut manager, "Asha");

    // Payment first: the record is created on demand and shows an advance.
    let payment_id = manager
        .record_payment(asha, 100.0, PaymentMode::Online, june(10), Some("advance".into()))
        .unwrap();
    assert_eq!(manager.book().payment(payment_id).unwrap().note, "advance");
    assert_eq!(manager.statement(asha, june_month()).unwrap().balance_due, -100.0);
    assert_eq!(
        BalanceStanding::of(manager.canonical_due(asha).unwrap().amount),
        BalanceStanding::Advance
    );

    let backdated = manager
        .add_one_time_delivery(asha, june(5), TimeSlot::Morning, &[ItemSpec::new("milk", 2.0)])
        .unwrap();
    manager.mark_delivered(backdated).unwrap();
    let record = manager.statement(asha, june_month()).unwrap();
    assert_eq!(record.current_month_total, 120.0);
    assert_eq!(record.balance_due, 20.0);
    assert_ledger_sums(&manager);
}
