// src/portal/round.rs

use crate::{client::PortalClient, constants::portal, error::*};
use log::{debug, info, warn};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static ROUND_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"jx0502zbid=([^&]+)").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// 登录后的导航：打开学生主页与选课轮次列表，建立服务端页面状态。
pub async fn navigate(client: &PortalClient) -> AppResult<()> {
    client.get_text(portal::MAIN_FRAME).await?;
    debug!("已打开学生主页");
    client.get_text(portal::ROUND_LIST).await?;
    debug!("已打开选课轮次列表");
    Ok(())
}

/// 获取选课轮次列表并选出目标学期的轮次 ID。
pub async fn resolve_round(client: &PortalClient, semester: &str) -> AppResult<Option<String>> {
    let html = client.get_text(portal::ROUND_LIST).await?;
    let round_id = select_round(&html, semester);
    match &round_id {
        Some(id) => info!("获取到选课轮次 ID: {}", id),
        None => warn!("未能从选课轮次列表中解析出轮次 ID"),
    }
    Ok(round_id)
}

/// 进入指定的选课轮次，之后才能访问各选课通道。
pub async fn enter_round(client: &PortalClient, round_id: &str) -> AppResult<()> {
    let request = client
        .get(portal::ROUND_ENTRY)?
        .query(&[("jx0502zbid", round_id)]);
    client.send_text(request).await?;
    info!("已进入选课轮次: {}", round_id);
    Ok(())
}

fn row_round_id(row: &scraper::ElementRef<'_>) -> Option<String> {
    row.select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| ROUND_ID_RE.captures(href))
        .map(|caps| caps[1].to_string())
}

/// 从轮次列表页面中选出轮次 ID。
///
/// `semester` 为空时返回第一个有效轮次；否则返回学期名称包含 `semester` 的行，
/// 没有匹配时退回扫描过程中遇到的第一个有效轮次。
pub fn select_round(html: &str, semester: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let semester = semester.trim();
    let mut fallback: Option<String> = None;

    // 第一行是表头
    for (index, row) in document.select(&ROW_SELECTOR).enumerate().skip(1) {
        if semester.is_empty() {
            if let Some(id) = row_round_id(&row) {
                return Some(id);
            }
            continue;
        }

        let cells: Vec<_> = row.select(&CELL_SELECTOR).collect();
        if cells.len() < 2 {
            warn!("选课轮次列表第 {} 行的单元格不足，已跳过", index);
            continue;
        }
        let Some(id) = row_round_id(&row) else {
            warn!("选课轮次列表第 {} 行没有有效的轮次链接，已跳过", index);
            continue;
        };
        let label = cells[1].text().collect::<String>();
        if label.contains(semester) {
            debug!("学期 '{}' 匹配到轮次: {}", label.trim(), id);
            return Some(id);
        }
        fallback.get_or_insert(id);
    }

    if fallback.is_some() {
        warn!("未找到学期 '{}' 对应的选课轮次，使用第一个有效轮次", semester);
    }
    fallback
}
