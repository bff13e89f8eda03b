use crate::infra::{AnonymousIdentity, CapturingAlertSink, RelayStore};
use clap::Args;
use reliefnet::config::CoordinationConfig;
use reliefnet::error::AppError;
use reliefnet::gateway::{
    GatewayError, IdentityProvider, RequestGateway, ShelterGateway, Subscription,
};
use reliefnet::notify::Alert;
use reliefnet::profiles::{ProfileService, UserProfile, UserRole};
use reliefnet::requests::engine::EngineError;
use reliefnet::requests::{LifecycleEngine, Priority, Request, RequestDraft, RequestKind};
use reliefnet::shelters::seed::{parse_shelters, sample_shelters, upload_shelters};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Latitude of the demo NGO responder (defaults to central Delhi)
    #[arg(long)]
    pub(crate) ngo_lat: Option<f64>,
    /// Longitude of the demo NGO responder
    #[arg(long)]
    pub(crate) ngo_lng: Option<f64>,
    /// Skip seeding and listing the safe shelters
    #[arg(long)]
    pub(crate) skip_shelters: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ShelterSeedArgs {
    /// Shelter CSV to validate and upload; omitted, the built-in sample set
    /// is used
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) async fn run_shelter_seed(args: ShelterSeedArgs) -> Result<(), AppError> {
    let shelters = match args.csv {
        Some(path) => {
            let file = File::open(&path)?;
            let shelters = parse_shelters(file)?;
            println!("Validated {} shelter rows from {}", shelters.len(), path.display());
            shelters
        }
        None => {
            let shelters = sample_shelters();
            println!("Using the built-in sample set ({} shelters)", shelters.len());
            shelters
        }
    };

    for shelter in &shelters {
        println!(
            "  {} at ({:.4}, {:.4}) with {} of {} spots free",
            shelter.name, shelter.lat, shelter.lng, shelter.available_spots, shelter.capacity
        );
    }

    let store = RelayStore::default();
    let ids = upload_shelters(&store, shelters).await?;
    println!("Uploaded {} shelters", ids.len());
    Ok(())
}

type DemoEngine = LifecycleEngine<RelayStore, RelayStore, AnonymousIdentity, CapturingAlertSink>;

struct Participant {
    engine: Arc<DemoEngine>,
    identity: Arc<AnonymousIdentity>,
    alerts: Arc<CapturingAlertSink>,
    requests: Subscription<Request>,
}

fn participant(store: &Arc<RelayStore>, role: UserRole) -> Participant {
    let identity = Arc::new(AnonymousIdentity::default());
    let alerts = Arc::new(CapturingAlertSink::default());
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        store.clone(),
        identity.clone(),
        alerts.clone(),
        CoordinationConfig::default(),
    ));
    engine.set_viewer_role(Some(role));
    let requests = store.subscribe_requests();
    Participant {
        engine,
        identity,
        alerts,
        requests,
    }
}

async fn next_snapshot(sub: &mut Subscription<Request>) -> Result<Vec<Request>, AppError> {
    match sub.recv().await {
        Some(Ok(snapshot)) => Ok(snapshot),
        Some(Err(err)) => Err(AppError::Engine(EngineError::Gateway(err))),
        None => Err(AppError::Engine(EngineError::Gateway(
            GatewayError::Unavailable("request subscription closed".to_string()),
        ))),
    }
}

async fn sync(participant: &mut Participant) -> Result<(), AppError> {
    let snapshot = next_snapshot(&mut participant.requests).await?;
    participant.engine.ingest_request_snapshot(snapshot);
    Ok(())
}

fn print_alerts(label: &str, alerts: Vec<Alert>) {
    if alerts.is_empty() {
        println!("  [{label}] no alerts");
        return;
    }
    for alert in alerts {
        println!("  [{label}] {}: {}", alert.title, alert.body);
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let ngo_location = reliefnet::geo::GeoPoint::new(
        args.ngo_lat.unwrap_or(28.65),
        args.ngo_lng.unwrap_or(77.20),
    );

    println!("Relief coordination demo");

    let store = Arc::new(RelayStore::default());
    let mut victim = participant(&store, UserRole::Victim);
    let mut ngo = participant(&store, UserRole::NgoOrg);
    ngo.engine.set_last_location(Some(ngo_location));

    // Empty baselines so the scripted activity below registers as new.
    sync(&mut victim).await?;
    sync(&mut ngo).await?;

    let ngo_uid = ngo.identity.sign_in_anonymously().await.map_err(EngineError::from)?;
    let profiles = ProfileService::new(store.clone(), ngo.identity.clone());
    profiles
        .save(UserProfile {
            uid: ngo_uid,
            role: UserRole::NgoOrg,
            display_name: Some("Relief Works Foundation".to_string()),
            victim_name: None,
            victim_phone: None,
            ngo_org_name: Some("Relief Works Foundation".to_string()),
            ngo_org_phone: Some("9876543210".to_string()),
            address: Some("45 Relief Lane, Delhi".to_string()),
            created_at: 0,
            updated_at: 0,
        })
        .await?;

    println!("\nA victim reports two needs");
    let rescue_id = victim
        .engine
        .create_request(
            RequestDraft {
                kind: RequestKind::Rescue,
                resource_type: None,
                title: "Family trapped on second floor".to_string(),
                notes: Some("Water rising, two adults and one child".to_string()),
                priority: Priority::High,
            },
            Some(28.6129),
            Some(77.2295),
        )
        .await?;
    sync(&mut victim).await?;
    sync(&mut ngo).await?;

    victim
        .engine
        .create_request(
            RequestDraft {
                kind: RequestKind::Resource,
                resource_type: Some("Water".to_string()),
                title: "Drinking water for 40 people".to_string(),
                notes: None,
                priority: Priority::Medium,
            },
            Some(28.6000),
            Some(77.2100),
        )
        .await?;
    sync(&mut victim).await?;
    sync(&mut ngo).await?;
    print_alerts("ngo", ngo.alerts.drain());

    println!("\nThe NGO claims the rescue request");
    ngo.engine
        .claim_request(&rescue_id, Some("45 minutes".to_string()))
        .await?;
    sync(&mut victim).await?;
    sync(&mut ngo).await?;
    print_alerts("victim", victim.alerts.drain());

    println!("\nThe NGO marks the rescue complete");
    ngo.engine.complete_request(&rescue_id, None).await?;
    sync(&mut victim).await?;
    sync(&mut ngo).await?;
    print_alerts("victim", victim.alerts.drain());

    println!("\nRequest board (priority order, NGO view)");
    for request in ngo.engine.visible_requests() {
        println!(
            "  [{}] {} ({}, {}) - {}",
            request.id,
            request.title,
            request.kind.label(),
            request.priority.label(),
            request.status.label()
        );
    }

    if !args.skip_shelters {
        println!("\nSafe shelters");
        upload_shelters(store.as_ref(), sample_shelters()).await?;
        let mut shelter_sub = store.subscribe_shelters();
        if let Some(Ok(snapshot)) = shelter_sub.recv().await {
            ngo.engine.ingest_shelter_snapshot(snapshot);
        }
        for shelter in ngo.engine.active_shelters() {
            println!("  {} ({} free)", shelter.name, shelter.availability_text());
        }
    }

    Ok(())
}
