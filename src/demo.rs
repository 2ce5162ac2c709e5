use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::Args;

use fieldops::error::AppError;
use fieldops::workflows::materials::{
    MaterialCategory, MaterialLedgerService, MaterialQuantity, MaterialUnit,
    RegisterMaterialRequest,
};
use fieldops::workflows::visits::domain::{
    CheckStatus, ChecklistCategory, PhotoCategory, PhotoKind, SiteId, VisitKind,
};
use fieldops::workflows::visits::evidence::{NewChecklistItem, NewMaterialUsage, NewPhoto, NewReading};
use fieldops::workflows::visits::repository::Clock;
use fieldops::workflows::visits::{GeoPoint, ScheduleVisitRequest, VisitService};

use crate::infra::{
    CollectingEventSink, InMemoryMaterialRepository, InMemoryVisitRepository,
    NoConfiguredPolicies, StaticSiteDirectory,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Report the check-in from ~1 km away to exercise the geofence anomaly.
    #[arg(long)]
    pub(crate) off_site: bool,
}

/// Clock that advances ten minutes per reading, so the scripted lifecycle
/// clears the minimum visit duration without sleeping.
struct SteppingClock {
    start: DateTime<Utc>,
    ticks: AtomicI64,
}

impl SteppingClock {
    fn new() -> Self {
        Self {
            start: Utc::now(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        self.start + Duration::minutes(10 * tick)
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let clock: Arc<dyn Clock> = Arc::new(SteppingClock::new());
    let sink = Arc::new(CollectingEventSink::default());

    let visits = Arc::new(InMemoryVisitRepository::default());
    let sites = Arc::new(StaticSiteDirectory::seeded());
    let service = VisitService::new(
        visits,
        sites,
        Arc::new(NoConfiguredPolicies),
        sink.clone(),
        clock.clone(),
    );

    let materials = Arc::new(InMemoryMaterialRepository::default());
    let ledger = MaterialLedgerService::new(materials, sink.clone(), clock.clone());

    println!("Field maintenance visit demo");

    let view = service.schedule(ScheduleVisitRequest {
        site_id: SiteId("site-cai-001".to_string()),
        engineer_id: "eng-omar".to_string(),
        engineer_name: "Omar Fathy".to_string(),
        scheduled_date: clock.now().date_naive(),
        kind: VisitKind::Preventive,
        supervisor: None,
        technician_names: vec!["Hossam Adel".to_string()],
        contact_person: Some("Site guard".to_string()),
        planned_order: Some(1),
    })?;
    let visit_id = view.visit_id;
    println!("scheduled {} ({})", visit_id.0, view.visit_number);

    let pieces =
        |amount: f64| MaterialQuantity::new(amount, MaterialUnit::Piece).map_err(map_stock);
    let material_id = ledger.register(RegisterMaterialRequest {
        code: "cbl-rg8".to_string(),
        name: "Coaxial cable RG-8".to_string(),
        category: MaterialCategory::Cable,
        initial_stock: pieces(20.0)?,
        minimum_stock: pieces(5.0)?,
        unit_cost: 14.5,
        supplier: Some("Delta Telecom Supplies".to_string()),
    })?;
    ledger.reserve(&material_id, visit_id.clone(), pieces(4.0)?)?;

    let on_site = GeoPoint::new(30.0444, 31.2357).map_err(map_visit)?;
    service.start(&visit_id, on_site)?;

    let reported = if args.off_site {
        GeoPoint::new(30.0544, 31.2357).map_err(map_visit)?
    } else {
        on_site
    };
    let outcome = service.check_in(&visit_id, reported)?;
    println!(
        "checked in {:.2} m from the site (within radius: {})",
        outcome.distance_from_site_m, outcome.within_radius
    );

    for kind in [PhotoKind::Before, PhotoKind::After] {
        service.add_photo(
            &visit_id,
            NewPhoto {
                kind,
                category: PhotoCategory::Rectifier,
                file_name: "rectifier.jpg".to_string(),
                file_reference: "blob://visits/rectifier.jpg".to_string(),
                description: None,
            },
        )?;
    }
    service.add_reading(
        &visit_id,
        NewReading {
            reading_type: "battery_voltage".to_string(),
            category: "power".to_string(),
            value: 53.4,
            unit: "V".to_string(),
            min_acceptable: Some(48.0),
            max_acceptable: Some(56.0),
        },
    )?;
    let item = service.add_checklist_item(
        &visit_id,
        NewChecklistItem {
            name: "Rectifier inspection".to_string(),
            category: ChecklistCategory::Power,
        },
    )?;
    service.update_checklist_item(&visit_id, item, CheckStatus::Ok, None)?;

    service.log_material_usage(
        &visit_id,
        NewMaterialUsage {
            material_id: material_id.clone(),
            material_code: "CBL-RG8".to_string(),
            material_name: "Coaxial cable RG-8".to_string(),
            quantity: pieces(4.0)?,
            unit_cost: 14.5,
            reason: "Replaced weathered feeder run".to_string(),
            before_photo: None,
            after_photo: None,
        },
    )?;
    ledger.consume_for_visit(&material_id, &visit_id, "eng-omar")?;

    service.complete(&visit_id)?;
    service.submit(&visit_id)?;
    service.start_review(&visit_id)?;
    let view = service.approve(&visit_id, "sup-01", "Nadia Hassan", Some("Clean visit"))?;

    println!(
        "\nFinal status:\n{}",
        serde_json::to_string_pretty(&view).map_err(map_json)?
    );

    let material = ledger.get(&material_id)?;
    println!(
        "\nMaterial {}: {} on hand, {} journal entries",
        material.code(),
        material.current_stock(),
        material.transactions().len()
    );

    println!("\nEvents:");
    for event in sink.drain() {
        println!("  {}", serde_json::to_string(&event).map_err(map_json)?);
    }

    Ok(())
}

fn map_stock(err: fieldops::workflows::materials::StockError) -> AppError {
    AppError::Workflow(Box::new(err))
}

fn map_visit(err: fieldops::workflows::visits::VisitError) -> AppError {
    AppError::Workflow(Box::new(err))
}

fn map_json(err: serde_json::Error) -> AppError {
    AppError::Workflow(Box::new(err))
}
