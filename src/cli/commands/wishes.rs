//! Stored wish history commands: banners, list, count, delete.

use crate::cli::commands::{open_storage, resolve_user};
use crate::error::{Error, Result};
use crate::model::{BannerType, Wish};
use crate::sync::{BannerCounts, Synchronizer, HISTORY_PAGE_SIZE};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output for banners.
#[derive(Serialize)]
struct BannersOutput {
    user_id: i64,
    banners: BTreeMap<BannerType, Vec<Wish>>,
}

/// Output for list.
#[derive(Serialize)]
struct ListOutput {
    user_id: i64,
    banner: BannerType,
    page: u32,
    page_size: u32,
    wishes: Vec<Wish>,
}

/// Output for count.
#[derive(Serialize)]
struct CountOutput {
    user_id: i64,
    counts: BannerCounts,
    total: usize,
}

/// Output for count with a banner filter.
#[derive(Serialize)]
struct BannerCountOutput {
    user_id: i64,
    banner: BannerType,
    count: usize,
}

/// Output for delete.
#[derive(Serialize)]
struct DeleteOutput {
    user_id: i64,
    deleted: usize,
}

fn rank_label(rank: u8) -> String {
    let stars = format!("{rank}★");
    match rank {
        5 => stars.yellow().bold().to_string(),
        4 => stars.magenta().to_string(),
        _ => stars.dimmed().to_string(),
    }
}

fn print_wish(wish: &Wish) {
    println!(
        "  {}  {}  {} {}",
        wish.time_display().dimmed(),
        rank_label(wish.rank),
        wish.name,
        format!("[{}]", wish.item_type).dimmed()
    );
}

/// Show the newest wishes of every banner.
///
/// # Errors
///
/// Returns `UserNotFound` or a database error.
pub fn execute_banners(key: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut storage = open_storage(db_path, None)?;
    let user = resolve_user(&storage, key)?;
    let banners = Synchronizer::offline(&mut storage).get_banners(&user)?;

    if json {
        let output = BannersOutput {
            user_id: user.id,
            banners,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    for (banner, wishes) in &banners {
        println!("{} ({})", banner.as_str().cyan().bold(), wishes.len());
        for wish in wishes {
            print_wish(wish);
        }
        println!();
    }

    Ok(())
}

/// List one page of a banner's history.
///
/// # Errors
///
/// Returns `InvalidArgument` for an unknown banner, `UserNotFound`, or a
/// database error.
pub fn execute_list(
    key: &str,
    banner: &str,
    page: u32,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let banner: BannerType = banner.parse()?;
    let mut storage = open_storage(db_path, None)?;
    let user = resolve_user(&storage, key)?;
    let wishes = Synchronizer::offline(&mut storage).find_by_user_and_banner(&user, banner, page)?;

    if json {
        let output = ListOutput {
            user_id: user.id,
            banner,
            page,
            page_size: HISTORY_PAGE_SIZE,
            wishes,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if wishes.is_empty() {
        println!("No wishes on page {page} of the {banner} banner.");
    } else {
        println!("{} page {page}", banner.as_str().cyan().bold());
        for wish in &wishes {
            print_wish(wish);
        }
    }

    Ok(())
}

/// Count stored wishes per banner, or for a single banner.
///
/// # Errors
///
/// Returns `InvalidArgument` for an unknown banner, `UserNotFound`, or a
/// database error.
pub fn execute_count(
    key: &str,
    banner: Option<&str>,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let banner = banner.map(str::parse::<BannerType>).transpose()?;
    let mut storage = open_storage(db_path, None)?;
    let user = resolve_user(&storage, key)?;
    let sync = Synchronizer::offline(&mut storage);

    if let Some(banner) = banner {
        let count = sync.count_by_user_and_banner(&user, banner)?;
        if json {
            let output = BannerCountOutput {
                user_id: user.id,
                banner,
                count,
            };
            println!("{}", serde_json::to_string(&output)?);
        } else {
            println!("{banner}: {count}");
        }
        return Ok(());
    }

    let counts = sync.count_by_banner(&user)?;
    if json {
        let output = CountOutput {
            user_id: user.id,
            total: counts.total(),
            counts,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        for (banner, count) in counts.iter() {
            println!("  {:<10} {count}", banner.as_str());
        }
        println!("  {:<10} {}", "total".bold(), counts.total());
    }

    Ok(())
}

/// Delete every stored wish of a user.
///
/// # Errors
///
/// Returns `InvalidArgument` without `yes`, `UserNotFound`, or a database
/// error.
pub fn execute_delete(
    key: &str,
    yes: bool,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "refusing to delete wish history without --yes".to_string(),
        ));
    }

    let mut storage = open_storage(db_path, actor)?;
    let user = resolve_user(&storage, key)?;
    let deleted = Synchronizer::offline(&mut storage).delete_all(&user)?;

    if json {
        let output = DeleteOutput {
            user_id: user.id,
            deleted,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Deleted {deleted} wishes for user {}", user.id);
    }

    Ok(())
}
