//! End-to-end export pipeline: article search → article rows → sibling tables.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use tecdoc_client::{LinkedPair, Requests, Transport};
use tecdoc_shared::{FetchConfig, Record, Result, Table};

use crate::context::RunContext;
use crate::extract::{self, extract_str, scalar_to_string};
use crate::hierarchy::ClassificationSummary;
use crate::records::{self, SummaryInput};

/// One supplier/article-number pair to export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Data supplier (brand) id, e.g. `355` for DT Spare Parts.
    pub supplier_id: i64,
    pub article_number: String,
    /// Which sibling endpoints to call.
    pub fetch: FetchConfig,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each article of a search result.
    fn article_processed(&self, article_number: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, ctx: &RunContext);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article_processed(&self, _article_number: &str, _current: usize, _total: usize) {}
    fn done(&self, _ctx: &RunContext) {}
}

/// Export one supplier/article-number pair into a fresh context.
pub async fn export_article<T: Transport>(
    transport: &T,
    requests: &Requests,
    request: &ExportRequest,
    progress: &dyn ProgressReporter,
) -> Result<RunContext> {
    export_articles(transport, requests, std::slice::from_ref(request), progress).await
}

/// Export several pairs into one context, sharing brand deduplication.
pub async fn export_articles<T: Transport>(
    transport: &T,
    requests: &Requests,
    batch: &[ExportRequest],
    progress: &dyn ProgressReporter,
) -> Result<RunContext> {
    let start = Instant::now();
    let mut ctx = RunContext::new();
    info!(run_id = %ctx.run_id, requests = batch.len(), "starting export");

    for request in batch {
        export_into(transport, requests, request, &mut ctx, progress).await?;
    }

    progress.done(&ctx);
    info!(
        run_id = %ctx.run_id,
        articles = ctx.count(Table::Articles),
        skipped = ctx.skipped(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "export complete"
    );
    Ok(ctx)
}

/// Search, then build every table for each article found.
#[instrument(skip_all, fields(supplier_id = request.supplier_id, article = %request.article_number))]
pub async fn export_into<T: Transport>(
    transport: &T,
    requests: &Requests,
    request: &ExportRequest,
    ctx: &mut RunContext,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let fetch = &request.fetch;

    progress.phase("Searching articles");
    let response = transport
        .call(&requests.search_articles(request.supplier_id, &request.article_number))
        .await;
    let articles = extract::list(&response, "articles");
    if articles.is_empty() {
        warn!("no articles found");
        return Ok(());
    }
    info!(found = articles.len(), "articles found");

    progress.phase("Resolving article name");
    let direct = transport
        .call(&requests.direct_search(request.supplier_id, &request.article_number))
        .await;
    let (article_name, internal_id) = records::direct_search_hit(&direct);
    debug!(%article_name, %internal_id, "direct search hit");

    let fallback_gtins = if articles.iter().all(|a| a.get("gtins").is_none()) {
        enhanced_gtins(transport, requests, &internal_id).await
    } else {
        String::new()
    };

    let facets = &response["assemblyGroupFacets"];
    let total = articles.len();

    progress.phase("Processing articles");
    for (index, article) in articles.iter().enumerate() {
        let number = extract_str(extract::object(article), &["articleNumber"], "");

        let mut built = records::build_article(article, facets, None);
        if fetch.classification {
            if let Ok(record) = &built {
                if record.value("category_path").is_empty() {
                    let summary = fetch_classification(transport, requests, record).await;
                    built = records::build_article(article, facets, summary.as_ref());
                }
            }
        }

        let category = built
            .as_ref()
            .map(|r| r.value("category_path").to_string())
            .unwrap_or_default();

        if let Some(article_id) = ctx.accept_article(built)? {
            let vehicles = fetch_siblings(transport, requests, fetch, &article_id, ctx).await;
            if fetch.brands {
                fetch_brand(transport, requests, article, ctx).await;
            }

            ctx.push_summary(records::build_summary(
                article,
                SummaryInput {
                    article_name: &article_name,
                    article_id: &internal_id,
                    category: &category,
                    fallback_gtins: &fallback_gtins,
                    vehicles: &vehicles,
                },
            ));
        }

        progress.article_processed(&number, index + 1, total);
    }

    Ok(())
}

/// Normalize a saved `getArticles` response without calling the API.
pub fn normalize_response(response: &Value) -> Result<RunContext> {
    let mut ctx = RunContext::new();
    let facets = &response["assemblyGroupFacets"];

    for article in extract::list(response, "articles") {
        let built = records::build_article(article, facets, None);
        let category = built
            .as_ref()
            .map(|r| r.value("category_path").to_string())
            .unwrap_or_default();

        if ctx.accept_article(built)?.is_some() {
            ctx.push_summary(records::build_summary(
                article,
                SummaryInput {
                    article_name: "",
                    article_id: "",
                    category: &category,
                    fallback_gtins: "",
                    vehicles: &[],
                },
            ));
        }
    }

    info!(
        articles = ctx.count(Table::Articles),
        skipped = ctx.skipped(),
        "response normalized"
    );
    Ok(ctx)
}

/// Parse the article pairs out of a linkage listing.
pub fn linked_pairs(response: &Value) -> Vec<LinkedPair> {
    extract::response_rows(response)
        .iter()
        .flat_map(|row| extract::list(&row["articleLinkages"], "array"))
        .filter_map(|link| {
            Some(LinkedPair {
                article_link_id: as_id(&link["articleLinkId"])?,
                linking_target_id: as_id(&link["linkingTargetId"])?,
            })
        })
        .collect()
}

/// An integer id given either as a number or a numeric string.
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// GTINs of the article found by the direct search, via the by-id lookup.
async fn enhanced_gtins<T: Transport>(transport: &T, requests: &Requests, internal_id: &str) -> String {
    let Ok(id) = internal_id.parse::<i64>() else {
        return String::new();
    };
    let response = transport.call(&requests.articles_by_id(&[id])).await;
    extract::list(&response, "articles")
        .first()
        .and_then(|article| article.get("gtins"))
        .map(scalar_to_string)
        .unwrap_or_default()
}

async fn fetch_classification<T: Transport>(
    transport: &T,
    requests: &Requests,
    record: &Record,
) -> Option<ClassificationSummary> {
    let id = record.value("article_id").parse::<i64>().ok()?;
    let response = transport.call(&requests.classification(id)).await;
    Some(ClassificationSummary::from_response(&response))
}

/// Call the enabled sibling endpoints for one article. Returns its vehicle rows.
async fn fetch_siblings<T: Transport>(
    transport: &T,
    requests: &Requests,
    fetch: &FetchConfig,
    article_id: &str,
    ctx: &mut RunContext,
) -> Vec<Record> {
    let Ok(id) = article_id.parse::<i64>() else {
        warn!(article_id, "non-numeric article id, skipping related endpoints");
        return Vec::new();
    };

    if fetch.attributes {
        let response = transport.call(&requests.article_criteria(id)).await;
        ctx.extend(Table::Attributes, records::build_attributes(article_id, &response));
    }
    if fetch.references {
        let response = transport.call(&requests.article_references(id)).await;
        ctx.extend(Table::References, records::build_references(article_id, &response));
    }
    if fetch.components {
        let response = transport.call(&requests.article_components(id)).await;
        ctx.extend(Table::Components, records::build_components(article_id, &response));
    }
    if fetch.relations {
        let response = transport.call(&requests.article_relations(id)).await;
        ctx.extend(Table::ArticleRelations, records::build_relations(article_id, &response));
    }

    if !fetch.vehicles {
        return Vec::new();
    }

    let target = fetch.linking_target_type.as_str();
    let linkages = transport.call(&requests.article_linkages(id, target)).await;
    let pairs = linked_pairs(&linkages);
    if pairs.is_empty() {
        debug!(article_id, "no vehicle linkages");
        return Vec::new();
    }

    let details = transport
        .call(&requests.linkage_details(id, &pairs, target))
        .await;
    let vehicles = records::build_vehicles(article_id, &details);
    ctx.extend(Table::Vehicles, vehicles.iter().cloned());
    vehicles
}

/// Add the article's brand row unless its supplier is already exported.
async fn fetch_brand<T: Transport>(
    transport: &T,
    requests: &Requests,
    article: &Value,
    ctx: &mut RunContext,
) {
    let source = extract::object(article);
    let supplier_id = extract_str(source, &["dataSupplierId"], "");
    if supplier_id.is_empty() || ctx.has_brand(&supplier_id) {
        return;
    }

    let response = match supplier_id.parse::<i64>() {
        Ok(id) => transport.call(&requests.brand_info(id)).await,
        Err(_) => {
            warn!(%supplier_id, "non-numeric supplier id, brand row without details");
            Value::Null
        }
    };
    let brand_name = extract_str(source, &["mfrName"], "");
    ctx.push(Table::Brands, records::build_brand(&supplier_id, &brand_name, &response));
}
