use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dairy_core::{CollectionStorage, CustomerService, DeliveryService, PosService};
use dairy_domain::{
    Catalog, Customer, DairyBook, ItemSpec, Product, SameDaySlots, Schedule, TimeSlot,
};
use dairy_storage_json::{JsonCollectionStorage, StoragePaths};
use tempfile::tempdir;

fn build_book(customer_count: usize) -> DairyBook {
    let mut book = DairyBook::with_catalog(Catalog::new(vec![
        Product::new("milk", "Milk", "litre", 60.0),
        Product::new("curd", "Curd", "cup", 25.0),
    ]));
    for idx in 0..customer_count {
        let slots = if idx % 4 == 0 {
            vec![TimeSlot::Morning, TimeSlot::Evening]
        } else {
            vec![TimeSlot::Morning]
        };
        let customer = Customer::fixed(format!("Customer {idx}"))
            .with_schedule(Schedule::daily(slots))
            .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)])
            .with_slot_items(TimeSlot::Evening, vec![ItemSpec::new("curd", 1.0)]);
        CustomerService::add(&mut book, customer).expect("add customer");
    }
    book
}

/// A month of delivered days for every customer.
fn build_month(customer_count: usize) -> DairyBook {
    let mut book = build_book(customer_count);
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
    let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
    for offset in 0..30 {
        let date = start + Duration::days(offset);
        for id in DeliveryService::generate(&mut book, date) {
            PosService::mark_delivered(&mut book, id, SameDaySlots::LastWriteWins, now)
                .expect("deliver");
        }
    }
    book
}

fn bench_generation(c: &mut Criterion) {
    let book = build_book(black_box(1_000));
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).expect("date");

    c.bench_function("plan_deliveries_1k_customers", |b| {
        b.iter(|| {
            let planned =
                DeliveryService::plan(today, &book.customers, &book.deliveries, &book.catalog);
            black_box(planned);
        })
    });
}

fn bench_ledger_folding(c: &mut Criterion) {
    let book = build_month(black_box(100));
    let date = NaiveDate::from_ymd_opt(2024, 7, 1).expect("date");
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 2, 0, 0).unwrap();

    c.bench_function("deliver_day_into_ledger_100_customers", |b| {
        b.iter_batched(
            || book.clone(),
            |mut book| {
                for id in DeliveryService::generate(&mut book, date) {
                    PosService::mark_delivered(&mut book, id, SameDaySlots::LastWriteWins, now)
                        .expect("deliver");
                }
                black_box(book);
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_collection_io(c: &mut Criterion) {
    let book = build_month(black_box(100));
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonCollectionStorage::new(StoragePaths::under(dir.path())).expect("json storage");

    c.bench_function("save_all_month_100_customers", |b| {
        b.iter(|| {
            storage.save_all(&book).expect("save book");
        })
    });

    storage.save_all(&book).expect("seed");

    c.bench_function("load_book_month_100_customers", |b| {
        b.iter(|| {
            let loaded = storage.load_book().expect("load book");
            black_box(loaded);
        })
    });
}

criterion_group!(benches, bench_generation, bench_ledger_folding, bench_collection_io);
criterion_main!(benches);
