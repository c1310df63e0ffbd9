//! `mainsite research`: faculty profiles from the research service.
//!
//! The listing is paginated; each researcher then links up to eight
//! publication lists, fetched by a bounded pool after the listing is
//! complete. A failed publication fetch fails only its researcher.

use std::collections::{BTreeMap, HashMap, HashSet};

use clap::Subcommand;
use serde_json::Value;
use tracing::{debug, info, warn};

use mainsite_config::{required, RESEARCH_URL_ENV};
use mainsite_recon::normalize::researcher::{
    citations_from_page, CitationKind, ResearcherRecord, CONTENT_TYPE, KEY_FIELD, PERSON_TYPE,
};
use mainsite_recon::store::FieldFilter;
use mainsite_recon::{normalize, NormalizedRecord, Reconciler, RecordError, RemoteRecord, RunOptions};
use mainsite_source_client::SourceClient;

use super::pool::run_pool;
use super::Context;
use crate::CliError;

#[derive(Subcommand)]
pub enum ResearchCommands {
    /// Converge faculty records to the research service
    #[command(after_help = "\
Examples:
  mainsite research import --research-url https://research.example.edu/api/ --store store.json
  mainsite research import --param college=Sciences --workers 8
  mainsite research import --force-update      # delete and re-create every faculty record")]
    Import {
        /// Research service base URL (default: $MAINSITE_RESEARCH_URL, then [research] api_url)
        #[arg(long)]
        research_url: Option<String>,

        /// Extra listing query parameter, overriding [research.params]. Repeatable.
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Write the page template on existing records too
        #[arg(long)]
        force_template: bool,

        /// Delete every faculty record first, so all are re-created
        #[arg(long)]
        force_update: bool,

        /// Parallel publication fetches (default: [research] workers)
        #[arg(long)]
        workers: Option<usize>,
    },
}

pub fn cmd_research(ctx: &Context, cmd: ResearchCommands) -> Result<(), CliError> {
    match cmd {
        ResearchCommands::Import { research_url, params, force_template, force_update, workers } => {
            let settings = &ctx.settings.research;
            let base = required(
                research_url.as_deref().or(settings.api_url.as_deref()),
                "research service URL",
                "--research-url",
                Some(RESEARCH_URL_ENV),
            )?;
            let mut query = settings.params.clone();
            query.extend(params);

            let run = ImportRun {
                listing_url: listing_url(&base),
                query,
                workers: workers.unwrap_or(settings.workers),
                force_template,
                force_update,
            };
            import(ctx, &run)
        }
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn listing_url(base: &str) -> String {
    format!("{}/research/researchers/", base.trim_end_matches('/'))
}

struct ImportRun {
    listing_url: String,
    query: BTreeMap<String, String>,
    workers: usize,
    force_template: bool,
    force_update: bool,
}

fn import(ctx: &Context, run: &ImportRun) -> Result<(), CliError> {
    let client = ctx.client(ctx.settings.research.timeout_secs)?;
    let query: Vec<(&str, &str)> = run.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    info!(url = %run.listing_url, "fetching researchers");
    let raw: Vec<Value> = client.fetch_all(&run.listing_url, &query)?.collect::<Result<_, _>>()?;
    let records: Vec<Result<ResearcherRecord, RecordError>> = raw.into_iter().map(ResearcherRecord::from_json).collect();

    let jobs = citation_jobs(&records);
    info!(researchers = records.len(), publication_lists = jobs.len(), workers = run.workers, "fetching publications");
    let citations = fetch_citations(&client, jobs, run.workers);
    let normalized = with_citations(records, &citations);

    let mut options = RunOptions::full_sync(CONTENT_TYPE, KEY_FIELD);
    options.criteria = options.criteria.with_field(FieldFilter::equals("person_type", PERSON_TYPE));
    options.purge_existing = run.force_update;
    options.force_initial_fields = run.force_template;

    let (path, mut repo) = ctx.open_store()?;
    let outcome = Reconciler::new(&mut repo, options).and_then(|reconciler| reconciler.run(normalized));
    let stats = ctx.finish(&path, &repo, outcome)?;
    ctx.report(&stats)
}

// ── Publication sub-fetches ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct CitationJob {
    employee_id: String,
    kind: CitationKind,
    url: String,
}

type Citations = HashMap<(String, CitationKind), Result<Vec<String>, String>>;

/// One job per linked publication list of every keyed researcher. A
/// repeated employee id is fetched once; the reconciler skips the repeat.
fn citation_jobs(records: &[Result<ResearcherRecord, RecordError>]) -> Vec<CitationJob> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();
    for record in records.iter().filter_map(|r| r.as_ref().ok()) {
        let employee_id = record.employee_id();
        if employee_id.is_empty() || !seen.insert(employee_id.to_string()) {
            continue;
        }
        for kind in CitationKind::ALL {
            if let Some(url) = record.citation_url(kind) {
                jobs.push(CitationJob { employee_id: employee_id.to_string(), kind, url: url.to_string() });
            }
        }
    }
    jobs
}

fn fetch_citations(client: &SourceClient, jobs: Vec<CitationJob>, workers: usize) -> Citations {
    run_pool(jobs, workers, |job| {
        let result = client.get_json(&job.url).map(|page| citations_from_page(&page));
        if let Err(err) = &result {
            warn!(employee = %job.employee_id, resource = job.kind.resource(), error = %err, "publication fetch failed");
        }
        result.map_err(|e| e.to_string())
    })
    .into_iter()
    .map(|(job, result)| ((job.employee_id, job.kind), result))
    .collect()
}

/// Attach fetched publications and normalize.
fn with_citations(
    records: Vec<Result<ResearcherRecord, RecordError>>,
    citations: &Citations,
) -> Vec<Result<NormalizedRecord, RecordError>> {
    records
        .into_iter()
        .map(|record| {
            let mut record = record?;
            attach(&mut record, citations)?;
            normalize(&RemoteRecord::Researcher(record), &[])
        })
        .collect()
}

fn attach(record: &mut ResearcherRecord, citations: &Citations) -> Result<(), RecordError> {
    let employee_id = record.employee_id().to_string();
    if employee_id.is_empty() {
        return Ok(());
    }
    for kind in CitationKind::ALL {
        if record.citation_url(kind).is_none() {
            continue;
        }
        let fetched = citations.get(&(employee_id.clone(), kind)).ok_or_else(|| RecordError::SubFetch {
            key: employee_id.clone(),
            resource: kind.resource().to_string(),
            message: "no result".to_string(),
        })?;
        match fetched {
            Ok(list) => {
                debug!(employee = %employee_id, resource = kind.resource(), count = list.len(), "publications attached");
                record.citations.insert(kind, list.clone());
            }
            Err(message) => {
                return Err(RecordError::SubFetch {
                    key: employee_id,
                    resource: kind.resource().to_string(),
                    message: message.clone(),
                })
            }
        }
    }
    Ok(())
}
