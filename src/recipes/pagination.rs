//! Cursor pagination over the recipe store and random sampling built on it.
//!
//! Pages are addressed by walking forward from the lowest id, one
//! `page_after` call per page, so no more than one page is ever held in
//! memory regardless of how deep the caller asks to go.

use std::collections::HashSet;

use rand::{rngs::StdRng, Rng, SeedableRng};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::id::Id;
use crate::recipes::dto::{PaginationRequest, PaginationResponse};
use crate::recipes::repo::RecipeReader;
use crate::recipes::repo_types::{Recipe, RecipeFilter};

/// Page size used to address sampled indices.
pub const SAMPLE_PAGE_SIZE: u32 = 10;

/// Returns page number `page_count` (0-based) of `page_size` recipes. Walking
/// past the end stops early and yields the last non-empty page.
pub async fn fetch_page<R>(
    recipes: &R,
    page_size: u32,
    page_count: u32,
    filter: &RecipeFilter,
) -> anyhow::Result<Vec<Recipe>>
where
    R: RecipeReader + ?Sized,
{
    let mut page = recipes.page_after(Id::min(), filter, page_size).await?;
    for advanced in 0..page_count {
        let Some(cursor) = page.last().map(|r| r.id) else {
            break;
        };
        let next = recipes.page_after(cursor, filter, page_size).await?;
        if next.is_empty() {
            debug!(advanced, page_count, "ran past the last page");
            break;
        }
        page = next;
    }
    Ok(page)
}

pub async fn paginate<R>(recipes: &R, req: PaginationRequest) -> Result<PaginationResponse, AppError>
where
    R: RecipeReader + ?Sized,
{
    if req.page_size == 0 {
        return Err(AppError::invalid(&["pageSize"]));
    }
    let page = fetch_page(recipes, req.page_size, req.page_count, &req.query_recipe).await?;
    let total = recipes.count_recipes(&req.query_recipe).await?;
    Ok(PaginationResponse {
        page_size: req.page_size,
        page_count: req.page_count,
        number_of_recipes: total,
        recipes: page,
    })
}

/// Up to `n` distinct recipes in draw order, seeded from the wall clock.
pub async fn get_random_recipes<R>(recipes: &R, n: u64) -> Result<Vec<Recipe>, AppError>
where
    R: RecipeReader + ?Sized,
{
    let seed = OffsetDateTime::now_utc().unix_timestamp_nanos() as u64;
    let mut rng = StdRng::seed_from_u64(seed);
    sample_recipes(recipes, n, &mut rng).await
}

/// Draws `min(n, total)` distinct indices and resolves each through
/// [`fetch_page`]. Count and page reads are not isolated: if recipes vanish
/// in between, an index can land past the end and the whole draw fails.
pub async fn sample_recipes<R, G>(recipes: &R, n: u64, rng: &mut G) -> Result<Vec<Recipe>, AppError>
where
    R: RecipeReader + ?Sized,
    G: Rng + Send,
{
    let everything = RecipeFilter::default();
    let total = recipes.count_recipes(&everything).await?;
    let n = n.min(total);
    if n < 1 {
        return Ok(Vec::new());
    }

    let indices = draw_distinct(rng, n, total);
    let mut picked = Vec::with_capacity(indices.len());
    for index in indices {
        let page_count = (index / u64::from(SAMPLE_PAGE_SIZE)) as u32;
        let offset = (index % u64::from(SAMPLE_PAGE_SIZE)) as usize;
        let page = fetch_page(recipes, SAMPLE_PAGE_SIZE, page_count, &everything).await?;
        let Some(recipe) = page.into_iter().nth(offset) else {
            warn!(index, total, "sampled index no longer exists");
            return Err(AppError::SampleOutOfRange { index });
        };
        picked.push(recipe);
    }
    Ok(picked)
}

fn draw_distinct<G: Rng + ?Sized>(rng: &mut G, n: u64, total: u64) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(n as usize);
    let mut drawn = Vec::with_capacity(n as usize);
    while (drawn.len() as u64) < n {
        let i = rng.gen_range(0..total);
        if seen.insert(i) {
            drawn.push(i);
        }
    }
    drawn
}
