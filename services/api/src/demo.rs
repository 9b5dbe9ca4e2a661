use crate::infra::{InMemoryActivityLog, InMemoryApplicationRepository, InMemoryStoreDirectory};
use clap::Args;
use std::sync::Arc;

use emi_portal::emi::LoanPolicy;
use emi_portal::error::AppError;
use emi_portal::portal::domain::{
    ApplicationDraft, ApplicationId, ApplicationStatus, MerchantContext, StoreDraft,
};
use emi_portal::portal::lifecycle::{ApplicationPatch, LifecyclePolicy};
use emi_portal::portal::report;
use emi_portal::portal::service::PortalService;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the full activity trail after the walkthrough
    #[arg(long)]
    pub(crate) list_activity: bool,
    /// Enforce the note-on-status-change policy during the walkthrough
    #[arg(long)]
    pub(crate) require_status_note: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SummaryReportArgs {
    /// Render the seeded applications as CSV instead of a text summary
    #[arg(long)]
    pub(crate) csv: bool,
}

type DemoService =
    PortalService<InMemoryApplicationRepository, InMemoryActivityLog, InMemoryStoreDirectory>;

fn build_service(lifecycle: LifecyclePolicy) -> Arc<DemoService> {
    Arc::new(PortalService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryActivityLog::default()),
        Arc::new(InMemoryStoreDirectory::default()),
        LoanPolicy::default(),
        lifecycle,
    ))
}

fn seed_applications(service: &DemoService) -> Result<Vec<ApplicationId>, AppError> {
    service.register_store(
        StoreDraft {
            name: "Tech World".to_string(),
            address: "12 Gulshan Avenue, Dhaka".to_string(),
            phone: "01811112222".to_string(),
            email: "techworld@example.com".to_string(),
            manager: "S. Chowdhury".to_string(),
        },
        "Admin User",
    )?;

    let context = MerchantContext {
        store: "Tech World".to_string(),
        merchant: "Current Merchant".to_string(),
    };

    let drafts = [
        ("Anika Rahman", "01712345678", 120_000.0, 24),
        ("Rafiq Islam", "01913456789", 60_000.0, 12),
        ("Salma Khatun", "01714567890", 250_000.0, 36),
    ];
    let mut ids = Vec::with_capacity(drafts.len());
    for (name, phone, amount, tenure) in drafts {
        let application = service.submit(
            ApplicationDraft {
                customer_name: name.to_string(),
                phone_number: phone.to_string(),
                email: format!(
                    "{}@example.com",
                    name.to_ascii_lowercase().replace(' ', ".")
                ),
                card_number: "4242-0000-1111-2222".to_string(),
                client_id: format!("CL-{phone}"),
                amount,
                tenure_months: tenure,
                approval_code: "AP-0001".to_string(),
                notes: String::new(),
            },
            context.clone(),
            "Current Merchant",
        )?;
        ids.push(application.id);
    }

    Ok(ids)
}

pub(crate) fn run_summary_report(args: SummaryReportArgs) -> Result<(), AppError> {
    let service = build_service(LifecyclePolicy::default());
    seed_applications(&service)?;

    if args.csv {
        let applications = service.list()?;
        let rendered = report::applications_csv(&applications)
            .map_err(|err| AppError::Io(std::io::Error::other(err.to_string())))?;
        print!("{rendered}");
        return Ok(());
    }

    print_summary(&service)?;
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_service(LifecyclePolicy {
        require_note_on_status_change: args.require_status_note,
    });

    println!("== EMI Portal demo ==");
    let ids = seed_applications(&service)?;

    let applications = service.list()?;
    println!("Seeded {} applications:", applications.len());
    for app in &applications {
        println!(
            "  {}  {:<16} {:>10.0} BDT x {:>2} months  EMI {:>6} BDT  [{}]",
            app.id,
            app.customer_name,
            app.amount,
            app.tenure_months,
            app.quoted_emi,
            app.status.label()
        );
    }

    // Walk the first application through a review cycle.
    let first = ids[0].clone();
    service.update_status(
        &first,
        ApplicationStatus::Verified,
        "Admin User",
        Some("documents checked".to_string()),
    )?;
    service.update_status(
        &first,
        ApplicationStatus::Approved,
        "Admin User",
        Some("all docs verified".to_string()),
    )?;
    service.edit_fields(
        &first,
        &ApplicationPatch {
            approval_code: Some("AP-7777".to_string()),
            ..ApplicationPatch::default()
        },
        "Admin User",
    )?;
    service.add_note(&first, "card mailed to customer", "Current Merchant")?;

    // Reject another to show the permissive lifecycle.
    let second = ids[1].clone();
    service.update_status(
        &second,
        ApplicationStatus::Rejected,
        "Admin User",
        Some("income proof missing".to_string()),
    )?;

    println!();
    print_summary(&service)?;

    if args.list_activity {
        println!();
        println!("Activity trail (newest first):");
        for entry in service.activity(None)? {
            println!(
                "  {}  {:<14} {:<22} {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.kind.label(),
                entry.actor,
                entry.details
            );
        }
    }

    Ok(())
}

fn print_summary(service: &DemoService) -> Result<(), AppError> {
    let summary = service.summary()?;
    println!("Portal summary:");
    println!("  applications: {}", summary.total_applications);
    for bucket in &summary.status_counts {
        println!("    {:<9} {}", bucket.label, bucket.count);
    }
    println!(
        "  requested: {:.0} BDT, combined monthly EMI: {} BDT",
        summary.total_requested_amount, summary.total_quoted_emi
    );
    for store in &summary.top_stores {
        println!(
            "  store {:<16} {} applications, {} approved ({:.0} BDT)",
            store.store, store.applications, store.approved, store.approved_amount
        );
    }
    Ok(())
}
