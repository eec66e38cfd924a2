//! End-to-end flows through [`FuelOpsService`] over the in-memory store.
//!
//! Readings → inventory (CAS) → closing → monthly / solvency / profitability.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use fuelops_analytics::{Debt, DebtStatus, Expense, SolvencyStatus};
    use fuelops_closing::{
        AttendantSession, ClosingState, ClosingStatus, PaymentChannel, PaymentEntry, ReceivedSource,
        ReconciliationStatus, SalesSource, SessionKey,
    };
    use fuelops_core::{
        AggregateRoot, AttendantId, DateRange, DebtId, DomainError, ExpectedVersion, ExpenseId, GradeId, NozzleId,
        PurchaseId, ReadingId, ShiftId,
    };
    use fuelops_inventory::{FuelGrade, InventoryPosition, Purchase, TankLevel};
    use fuelops_readings::DispenserReading;

    use crate::config::EngineSettings;
    use crate::service::{ClosingRequest, FuelOpsService, ServiceError};
    use crate::store::{FuelStore, InMemoryFuelStore, StoreError};

    type Service = FuelOpsService<Arc<InMemoryFuelStore>>;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn dec(units: i64) -> Decimal {
        Decimal::new(units, 0)
    }

    fn cents(value: i64) -> Decimal {
        Decimal::new(value, 2)
    }

    fn setup() -> (Service, Arc<InMemoryFuelStore>) {
        setup_with(EngineSettings::default())
    }

    fn setup_with(settings: EngineSettings) -> (Service, Arc<InMemoryFuelStore>) {
        fuelops_observability::init();
        let store = Arc::new(InMemoryFuelStore::new());
        (FuelOpsService::new(store.clone(), settings), store)
    }

    fn grade(store: &InMemoryFuelStore, code: &str, sale_price: Decimal) -> GradeId {
        let id = GradeId::new();
        store.insert_grade(FuelGrade {
            id,
            code: code.to_string(),
            name: format!("grade {code}"),
            sale_price,
        });
        id
    }

    fn stock(store: &InMemoryFuelStore, grade_id: GradeId, quantity: i64, average_cost: Decimal, capacity: i64) {
        let position = InventoryPosition::restore(grade_id, dec(quantity), average_cost, dec(capacity), 1);
        store.upsert_inventory(&position, ExpectedVersion::Any).unwrap();
    }

    fn reading(grade_id: GradeId, shift_id: ShiftId, date: NaiveDate, initial: i64, final_meter: i64) -> DispenserReading {
        DispenserReading {
            id: ReadingId::new(),
            nozzle_id: NozzleId::new(),
            grade_id,
            shift_id,
            date,
            initial_meter: dec(initial),
            final_meter: dec(final_meter),
            price_per_liter: dec(5),
        }
    }

    fn attendant(store: &InMemoryFuelStore) -> AttendantId {
        let id = AttendantId::new();
        store.add_attendant(id);
        id
    }

    #[test]
    fn reading_batch_reports_partial_success() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, dec(4), 5000);
        let shift = ShiftId::new();

        let valid = reading(gasoline, shift, day(5), 100, 150);
        let not_advanced = reading(gasoline, shift, day(5), 300, 300);
        let unknown = reading(GradeId::new(), shift, day(5), 0, 10);

        let report = service
            .record_readings(vec![valid.clone(), not_advanced.clone(), unknown.clone()])
            .unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].liters, Some(dec(50)));
        assert_eq!(report.applied[0].revenue, Some(dec(250)));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, not_advanced.key());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("unknown fuel grade"));

        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(950));
        assert!(store.get_reading(&not_advanced.key()).unwrap().is_some());
        assert!(store.get_reading(&unknown.key()).unwrap().is_none());
    }

    #[test]
    fn overwriting_a_reading_moves_only_the_difference() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, dec(4), 5000);

        let first = reading(gasoline, ShiftId::new(), day(5), 100, 150);
        service.record_readings(vec![first.clone()]).unwrap();

        let mut corrected = first.clone();
        corrected.final_meter = dec(170);
        service.record_readings(vec![corrected.clone()]).unwrap();
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(930));

        // Re-saving the same values is a no-op for inventory.
        service.record_readings(vec![corrected]).unwrap();
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(930));

        let stored = store.get_inventory(gasoline).unwrap().unwrap();
        assert_eq!(stored.quantity(), dec(930));
    }

    #[test]
    fn failed_regrade_reverts_the_old_grade_and_retries_cleanly() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        let diesel = grade(&store, "DS", cents(550));
        stock(&store, gasoline, 1000, dec(4), 5000);
        stock(&store, diesel, 1000, dec(4), 5000);

        let first = reading(gasoline, ShiftId::new(), day(5), 100, 150);
        service.record_readings(vec![first.clone()]).unwrap();
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(950));

        let mut regraded = first.clone();
        regraded.grade_id = diesel;
        store.fail_inventory_writes(diesel);
        let err = service.record_readings(vec![regraded.clone()]).unwrap_err();
        assert!(matches!(err, ServiceError::Storage(StoreError::Unavailable(_))));

        // The give-back on the old grade is undone along with the reading.
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(950));
        assert_eq!(store.get_inventory(gasoline).unwrap().unwrap().quantity(), dec(950));
        assert_eq!(service.inventory(diesel).unwrap().quantity(), dec(1000));
        assert_eq!(store.get_reading(&first.key()).unwrap().unwrap().grade_id, gasoline);

        store.restore_inventory_writes(diesel);
        service.record_readings(vec![regraded.clone()]).unwrap();

        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(1000));
        assert_eq!(service.inventory(diesel).unwrap().quantity(), dec(950));
        assert_eq!(store.get_reading(&first.key()).unwrap().unwrap().grade_id, diesel);
    }

    #[test]
    fn failed_inventory_write_rolls_the_reading_back() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, dec(4), 5000);
        store.fail_operation("upsert_inventory");

        let r = reading(gasoline, ShiftId::new(), day(5), 100, 150);
        let err = service.record_readings(vec![r.clone()]).unwrap_err();

        assert!(matches!(err, ServiceError::Storage(StoreError::Unavailable(_))));
        assert!(store.get_reading(&r.key()).unwrap().is_none());
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(1000));

        store.restore_operation("upsert_inventory");
        service.record_readings(vec![r]).unwrap();
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(950));
    }

    #[test]
    fn lost_race_reloads_and_replays_the_sale() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, dec(4), 5000);
        assert_eq!(service.inventory(gasoline).unwrap().quantity(), dec(1000));

        // Another writer moves the stored row after we cached it.
        let external = InventoryPosition::restore(gasoline, dec(800), dec(4), dec(5000), 2);
        store.upsert_inventory(&external, ExpectedVersion::Any).unwrap();

        service
            .record_readings(vec![reading(gasoline, ShiftId::new(), day(5), 0, 50)])
            .unwrap();

        let stored = store.get_inventory(gasoline).unwrap().unwrap();
        assert_eq!(stored.quantity(), dec(750));
        assert_eq!(stored.version(), 3);
        assert_eq!(service.inventory(gasoline).unwrap(), stored);
    }

    #[test]
    fn purchase_reweights_cost_once() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, cents(350), 5000);

        let purchase = Purchase::new(PurchaseId::new(), gasoline, day(6), dec(500), dec(2000)).unwrap();
        let receipt = service.register_purchase(purchase.clone()).unwrap();

        assert!(receipt.newly_recorded);
        assert_eq!(receipt.position.quantity(), dec(1500));
        assert_eq!(receipt.position.average_cost().round_dp(4), Decimal::new(36667, 4));

        let again = service.register_purchase(purchase).unwrap();
        assert!(!again.newly_recorded);
        assert_eq!(again.position.quantity(), dec(1500));
        assert_eq!(service.purchase_history(gasoline, day(1)).unwrap().len(), 1);
    }

    #[test]
    fn purchase_retry_after_failed_record_does_not_double_apply() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, cents(350), 5000);
        let purchase = Purchase::new(PurchaseId::new(), gasoline, day(6), dec(500), dec(2000)).unwrap();

        store.fail_operation("record_purchase");
        let err = service.register_purchase(purchase.clone()).unwrap_err();
        match err {
            ServiceError::PartialSave { step, completed, .. } => {
                assert_eq!(step, "purchase");
                assert_eq!(completed, vec!["inventory"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let tracked = |service: &Service| {
            service
                .ledger()
                .execute(gasoline, |entry| Ok::<_, DomainError>(entry.has_applied(purchase.id)))
                .unwrap()
        };
        assert!(tracked(&service));

        store.restore_operation("record_purchase");
        let receipt = service.register_purchase(purchase.clone()).unwrap();
        assert!(receipt.newly_recorded);
        assert_eq!(receipt.position.quantity(), dec(1500));

        // Once recorded, storage vouches for the purchase and the ledger lets go of it.
        assert!(!tracked(&service));
        let again = service.register_purchase(purchase.clone()).unwrap();
        assert!(!again.newly_recorded);
        assert_eq!(again.position.quantity(), dec(1500));
    }

    #[test]
    fn purchase_for_unknown_grade_is_a_missing_reference() {
        let (service, _store) = setup();
        let purchase = Purchase::new(PurchaseId::new(), GradeId::new(), day(6), dec(500), dec(2000)).unwrap();
        let err = service.register_purchase(purchase).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::MissingReference { .. })));
    }

    #[test]
    fn closing_is_idempotent_per_date_and_shift() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, dec(4), 5000);
        let shift = ShiftId::new();
        let ana = attendant(&store);

        service
            .record_readings(vec![reading(gasoline, shift, day(5), 100, 150)])
            .unwrap();

        let request = ClosingRequest::new(day(5), shift).with_session(
            AttendantSession::draft("row-1")
                .with_attendant(ana)
                .with_amount(PaymentChannel::Card, dec(200))
                .with_amount(PaymentChannel::Cash, dec(50)),
        );

        let first = service.save_closing(request.clone()).unwrap();
        assert_eq!(first.summary.figures.total_sales, dec(250));
        assert_eq!(first.summary.figures.sales_source, SalesSource::Readings);
        assert_eq!(first.summary.figures.status, ClosingStatus::Ok);
        assert_eq!(first.closing.state(), ClosingState::Draft);

        let second = service.save_closing(request).unwrap();
        assert_eq!(second.closing.id(), first.closing.id());
        assert!(second.closing.version() > first.closing.version());
        assert_eq!(store.list_closings(DateRange::single_day(day(5))).unwrap().len(), 1);

        // The draft row kept its durable id across saves.
        assert_eq!(first.sessions.applied[0].key, second.sessions.applied[0].key);
        assert!(!second.sessions.applied[0].key.is_draft());
        let record = service.load_closing(day(5), shift).unwrap().unwrap();
        assert_eq!(record.sessions.len(), 1);
    }

    #[test]
    fn resave_without_a_session_removes_its_stored_row() {
        let (service, store) = setup();
        let shift = ShiftId::new();
        let ana = attendant(&store);
        let bruno = attendant(&store);
        let ana_row = AttendantSession::draft("row-1")
            .with_attendant(ana)
            .with_amount(PaymentChannel::Cash, dec(100));
        let bruno_row = AttendantSession::draft("row-2")
            .with_attendant(bruno)
            .with_amount(PaymentChannel::Card, dec(400));

        service
            .save_closing(
                ClosingRequest::new(day(6), shift)
                    .with_session(ana_row.clone())
                    .with_session(bruno_row),
            )
            .unwrap();
        let outcome = service
            .save_closing(ClosingRequest::new(day(6), shift).with_session(ana_row))
            .unwrap();
        assert_eq!(outcome.closing.figures().gross_received, dec(100));

        let record = service.load_closing(day(6), shift).unwrap().unwrap();
        assert_eq!(record.sessions.len(), 1);
        assert_eq!(record.sessions[0].attendant_id, Some(ana));
        let stored_total: Decimal = record.sessions.iter().map(|s| s.declared_total()).sum();
        assert_eq!(stored_total, dec(100));
    }

    #[test]
    fn unpaid_shift_reads_as_pending() {
        let (service, store) = setup();
        let ana = attendant(&store);

        let outcome = service
            .save_closing(
                ClosingRequest::new(day(7), ShiftId::new())
                    .with_declared_sales(dec(1000))
                    .with_session(
                        AttendantSession::draft("row-1")
                            .with_attendant(ana)
                            .with_amount(PaymentChannel::Cash, dec(50)),
                    ),
            )
            .unwrap();

        assert_eq!(outcome.summary.figures.sales_source, SalesSource::Declared);
        assert_eq!(outcome.summary.figures.status, ClosingStatus::Pending);
        assert_eq!(outcome.summary.figures.variance, Decimal::ZERO);
        assert_eq!(outcome.summary.raw_variance, dec(-950));
    }

    #[test]
    fn payment_methods_override_attendants_and_carry_fees() {
        let (service, store) = setup();
        let ana = attendant(&store);

        let outcome = service
            .save_closing(
                ClosingRequest::new(day(7), ShiftId::new())
                    .with_declared_sales(dec(1000))
                    .with_session(
                        AttendantSession::draft("row-1")
                            .with_attendant(ana)
                            .with_amount(PaymentChannel::Cash, dec(900)),
                    )
                    .with_payment(PaymentEntry::new(PaymentChannel::Card, dec(600), dec(2)).unwrap())
                    .with_payment(PaymentEntry::new(PaymentChannel::Cash, dec(400), Decimal::ZERO).unwrap()),
            )
            .unwrap();

        let figures = &outcome.summary.figures;
        assert_eq!(figures.received_source, ReceivedSource::PaymentMethods);
        assert_eq!(figures.gross_received, dec(1000));
        assert_eq!(figures.fee_total, dec(12));
        assert_eq!(figures.net_received, dec(988));
        assert_eq!(figures.non_cash_net_received, dec(588));
        assert_eq!(figures.status, ClosingStatus::Ok);
    }

    #[test]
    fn unknown_attendant_is_reported_and_left_out() {
        let (service, store) = setup();
        let ana = attendant(&store);

        let outcome = service
            .save_closing(
                ClosingRequest::new(day(8), ShiftId::new())
                    .with_session(AttendantSession::draft("known").with_attendant(ana))
                    .with_session(AttendantSession::draft("stranger").with_attendant(AttendantId::new())),
            )
            .unwrap();

        assert_eq!(outcome.sessions.applied.len(), 1);
        assert_eq!(outcome.sessions.failed.len(), 1);
        assert_eq!(outcome.sessions.failed[0].key, SessionKey::Draft("stranger".to_string()));
    }

    #[test]
    fn legacy_marker_is_migrated_on_save() {
        let (service, store) = setup();
        let ana = attendant(&store);
        let mut session = AttendantSession::draft("row-1").with_attendant(ana);
        session.observation = "[CONFERIDO] ok".to_string();

        let outcome = service
            .save_closing(ClosingRequest::new(day(8), ShiftId::new()).with_session(session))
            .unwrap();

        let saved = &outcome.sessions.applied[0];
        assert_eq!(saved.status, ReconciliationStatus::Reconciled);
        assert_eq!(saved.observation, "ok");
    }

    #[test]
    fn closing_an_unready_shift_is_refused_and_nothing_is_saved() {
        let (service, store) = setup();
        let shift = ShiftId::new();

        let err = service
            .save_closing(ClosingRequest::new(day(9), shift).with_declared_sales(dec(100)).closing())
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidInput(_))));
        assert!(store.list_closings(DateRange::single_day(day(9))).unwrap().is_empty());
    }

    #[test]
    fn ready_shift_closes() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 1000, dec(4), 5000);
        let shift = ShiftId::new();
        let ana = attendant(&store);
        service
            .record_readings(vec![reading(gasoline, shift, day(10), 0, 50)])
            .unwrap();

        let outcome = service
            .save_closing(
                ClosingRequest::new(day(10), shift)
                    .with_session(
                        AttendantSession::draft("row-1")
                            .with_attendant(ana)
                            .with_amount(PaymentChannel::Card, dec(250)),
                    )
                    .closing(),
            )
            .unwrap();

        assert!(outcome.closing.is_closed());

        // A later plain save keeps the shift closed.
        let resaved = service.save_closing(ClosingRequest::new(day(10), shift)).unwrap();
        assert!(resaved.closing.is_closed());
    }

    #[test]
    fn failed_step_is_reported_and_retry_succeeds() {
        let (service, store) = setup();
        let shift = ShiftId::new();
        let request = ClosingRequest::new(day(11), shift)
            .with_declared_sales(dec(300))
            .with_payment(PaymentEntry::new(PaymentChannel::Card, dec(300), Decimal::ONE).unwrap());

        store.fail_operation("replace_payment_entries");
        let err = service.save_closing(request.clone()).unwrap_err();
        match err {
            ServiceError::PartialSave { step, completed, source } => {
                assert_eq!(step, "payment_entries");
                assert_eq!(completed, vec!["closing", "attendant_sessions"]);
                assert!(matches!(source, StoreError::Unavailable(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(service.load_closing(day(11), shift).unwrap().unwrap().payments.is_empty());

        store.restore_operation("replace_payment_entries");
        service.save_closing(request).unwrap();
        let record = service.load_closing(day(11), shift).unwrap().unwrap();
        assert_eq!(record.payments.len(), 1);
        assert_eq!(store.list_closings(DateRange::single_day(day(11))).unwrap().len(), 1);
    }

    #[test]
    fn storage_outage_is_surfaced_verbatim() {
        let (service, store) = setup();
        store.fail_operation("list_readings");

        let err = service.save_closing(ClosingRequest::new(day(12), ShiftId::new())).unwrap_err();
        assert!(matches!(err, ServiceError::Storage(StoreError::Unavailable(_))));
    }

    #[test]
    fn solvency_outlook_from_closings_and_debts() {
        let settings = EngineSettings {
            balance_window_days: 1,
            revenue_window_days: 5,
            ..EngineSettings::default()
        };
        let (service, store) = setup_with(settings);
        let today = day(20);
        let gasoline = grade(&store, "GC", dec(6));
        stock(&store, gasoline, 5000, dec(5), 10_000);

        // Card 2000 net today: balance 2000, pace 2000 / 5 = 400 per day.
        service
            .save_closing(
                ClosingRequest::new(today, ShiftId::new())
                    .with_declared_sales(dec(2000))
                    .with_payment(PaymentEntry::new(PaymentChannel::Card, dec(2000), Decimal::ZERO).unwrap()),
            )
            .unwrap();
        service
            .record_readings(vec![reading(gasoline, ShiftId::new(), today, 0, 400)])
            .unwrap();

        let due = day(29) + chrono::Days::new(1); // 10 days out
        store.add_debt(Debt {
            id: DebtId::new(),
            description: "supplier".to_string(),
            amount: dec(5000),
            due_date: due,
            status: DebtStatus::Pending,
        });
        store.add_debt(Debt {
            id: DebtId::new(),
            description: "payroll".to_string(),
            amount: dec(8000),
            due_date: due,
            status: DebtStatus::Pending,
        });
        store.add_debt(Debt {
            id: DebtId::new(),
            description: "settled".to_string(),
            amount: dec(9999),
            due_date: due,
            status: DebtStatus::Paid,
        });

        let outlook = service.solvency_outlook(today).unwrap();
        let report = &outlook.report;

        assert_eq!(report.current_balance, dec(2000));
        assert_eq!(report.average_daily_revenue, dec(400));
        assert_eq!(report.debts.len(), 2);
        let statuses: Vec<_> = report.debts.iter().map(|d| d.status).collect();
        assert!(statuses.contains(&SolvencyStatus::Yellow));
        assert!(statuses.contains(&SolvencyStatus::Red));
        assert_eq!(report.total_deficit, dec(2000));
        assert_eq!(outlook.status, SolvencyStatus::Red);

        // Margin 6 - 5 = 1 per liter: 13000 pending needs 13000 L; 400 L sold so far.
        assert_eq!(outlook.sales_goal.margin_per_liter, dec(1));
        assert_eq!(outlook.sales_goal.liters_needed, dec(13_000));
        assert_eq!(outlook.sales_goal.liters_sold, dec(400));
        assert_eq!(outlook.sales_goal.remaining, dec(12_600));
    }

    #[test]
    fn monthly_summary_mixes_readings_and_closings() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", dec(5));
        stock(&store, gasoline, 5000, dec(4), 10_000);
        let shift = ShiftId::new();

        service
            .record_readings(vec![
                reading(gasoline, shift, day(1), 0, 50),
                reading(gasoline, shift, day(2), 0, 100),
            ])
            .unwrap();
        service
            .save_closing(
                ClosingRequest::new(day(2), shift)
                    .with_declared_sales(dec(520))
                    .with_payment(PaymentEntry::new(PaymentChannel::Card, dec(500), dec(2)).unwrap()),
            )
            .unwrap();

        let summary = service.monthly_summary(2024, 2).unwrap();

        assert_eq!(summary.days_with_data, 2);
        assert_eq!(summary.days_in_month, 29);
        // Day 1: 250 revenue, 50 margin. Day 2: closing says 520, margin 100, fees 10.
        assert_eq!(summary.totals.volume, dec(150));
        assert_eq!(summary.totals.revenue, dec(770));
        assert_eq!(summary.totals.fees, dec(10));
        assert_eq!(summary.totals.profit, dec(140));
        assert_eq!(summary.projection.volume, dec(2175));
        assert_eq!(summary.volume_by_grade.get(&gasoline), Some(&dec(150)));
    }

    #[test]
    fn profitability_covers_every_catalog_grade() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(599));
        let ethanol = grade(&store, "ET", cents(450));
        stock(&store, gasoline, 5000, dec(5), 10_000);
        stock(&store, ethanol, 1000, cents(400), 10_000);

        let mut sale = reading(gasoline, ShiftId::new(), day(3), 0, 1000);
        sale.price_per_liter = cents(580);
        service.record_readings(vec![sale]).unwrap();
        store.add_expense(Expense {
            id: ExpenseId::new(),
            date: day(3),
            description: "payroll".to_string(),
            amount: dec(200),
        });

        let report = service
            .profitability_report(DateRange::month(2024, 2).unwrap())
            .unwrap();

        assert_eq!(report.expense_per_liter, cents(20));
        assert_eq!(report.grades.len(), 2);
        let gc = report.grades.iter().find(|g| g.grade_id == gasoline).unwrap();
        assert_eq!(gc.profit_per_liter, cents(60));
        assert_eq!(gc.total_profit, dec(600));
        let et = report.grades.iter().find(|g| g.grade_id == ethanol).unwrap();
        assert_eq!(et.practiced_price, cents(450));
        assert_eq!(report.ranking[0].grade_id, gasoline);
        // Nothing was sold in January.
        let previous = report.previous_period.unwrap();
        assert_eq!(previous.period, DateRange::month(2024, 1).unwrap());
        assert_eq!(previous.volume, Decimal::ZERO);
    }

    #[test]
    fn profitability_compares_with_the_previous_month() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 5000, dec(5), 10_000);

        let january = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        service
            .record_readings(vec![
                reading(gasoline, ShiftId::new(), january, 0, 400),
                reading(gasoline, ShiftId::new(), day(3), 0, 500),
            ])
            .unwrap();

        let report = service
            .profitability_report(DateRange::month(2024, 2).unwrap())
            .unwrap();

        assert_eq!(report.total_volume, dec(500));
        assert_eq!(report.total_revenue, dec(2500));
        let previous = report.previous_period.unwrap();
        assert_eq!(previous.volume, dec(400));
        assert_eq!(previous.revenue, dec(2000));
        assert_eq!(previous.volume_change_percent, dec(25));
        assert_eq!(previous.revenue_change_percent, dec(25));
    }

    #[test]
    fn depletion_forecast_uses_trailing_sales() {
        let (service, store) = setup();
        let diesel = grade(&store, "DS", cents(620));
        stock(&store, diesel, 1000, dec(5), 2000);

        service
            .record_readings(vec![reading(diesel, ShiftId::new(), day(14), 0, 700)])
            .unwrap();

        let forecast = service.depletion_forecast(diesel, day(14)).unwrap();
        assert_eq!(forecast.quantity, dec(300));
        assert_eq!(forecast.daily_average, dec(100));
        assert_eq!(forecast.days_remaining, 3);
        assert_eq!(forecast.level, Some(TankLevel::Low));

        assert_eq!(service.depletion_forecasts(day(14)).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_readings_on_one_grade_are_serialised() {
        let (service, store) = setup();
        let gasoline = grade(&store, "GC", cents(600));
        stock(&store, gasoline, 10_000, dec(4), 20_000);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || {
                    let shift = ShiftId::new();
                    for _ in 0..25 {
                        let report = service
                            .record_readings(vec![reading(gasoline, shift, day(15), 10, 12)])
                            .unwrap();
                        assert_eq!(report.applied.len(), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.get_inventory(gasoline).unwrap().unwrap();
        assert_eq!(stored.quantity(), dec(9600));
        assert_eq!(stored.version(), 201);
        assert_eq!(service.inventory(gasoline).unwrap(), stored);
    }
}
