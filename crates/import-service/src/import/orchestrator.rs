//! 导入编排器
//!
//! 一个批次的处理分两层：
//! - `plan_row`：纯函数，对单行做用户 ID 提取、批次内去重和全量
//!   规则评估，产出显式的 [`RowDecision`]，不触碰数据库；
//! - [`ImportOrchestrator::run`]：把所有行的计划在同一个事务内落库，
//!   行级、规则级错误只计数不中断，存储错误回滚整个批次。
//!
//! 同一用户跨批次并发导入时没有额外的用户级锁，依赖批次事务的
//! 行锁串行化余额更新。

use std::collections::HashSet;

use chrono::{Duration, Utc};
use livepoints_rule_engine::{ColumnResolver, PointRule, Row, RuleEvaluator};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::models::{ImportSummary, LedgerSource};
use crate::repository::{LedgerRepository, NewLedgerEntry, RuleRepository, UserRepository};

/// 用户 ID 的候选列名，按优先顺序匹配
const USER_ID_ALIASES: [&str; 6] = ["用户ID", "用户id", "user_id", "userid", "uid", "用户编号"];

/// 单条规则的命中结果
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub rule_id: i64,
    pub rule_name: String,
    pub points: i64,
    pub validity_days: Option<i32>,
    /// 命中的列名（规则配置里的拼写）
    pub column: String,
    /// 命中时的单元格原始值
    pub matched_value: String,
}

/// 行处理计划
#[derive(Debug, Clone)]
pub struct RowPlan {
    pub user_id: String,
    pub matches: Vec<RuleMatch>,
}

/// 行失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFailure {
    /// 所有候选列都取不到非空用户 ID
    MissingUserId,
    /// 同一文件内该用户已出现过（保留首次出现的行）
    DuplicateInFile(String),
}

/// 单行的评估结论
#[derive(Debug, Clone)]
pub enum RowDecision {
    Process(RowPlan),
    Failed(RowFailure),
}

/// 从行中提取用户 ID
///
/// 按候选列名顺序解析，取到的值去掉所有空白字符。
/// 全部取不到或为空 → None。
fn extract_user_id(resolver: &ColumnResolver<'_>) -> Option<String> {
    let aliases: Vec<String> = USER_ID_ALIASES.iter().map(|s| s.to_string()).collect();
    let value = resolver.resolve(&aliases)?;
    let id: String = display_value(value)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if id.is_empty() { None } else { Some(id) }
}

/// 单元格值转展示字符串（流水描述和 ID 提取共用）
///
/// Null（Excel 空单元格）转为空字符串，这样空 ID 单元格走
/// 缺失分支，而不是得到字面量 "null"。
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 评估单行，产出处理计划
///
/// `processed` 是批次内已处理用户的集合，由调用方跨行持有。
/// 规则评估错误按「该规则不命中」处理并告警，不让单条规则
/// 拖垮整行；零命中的行仍然是合法计划（0 积分）。
pub fn plan_row(row: &Row, rules: &[PointRule], processed: &mut HashSet<String>) -> RowDecision {
    let resolver = ColumnResolver::new(row);

    let Some(user_id) = extract_user_id(&resolver) else {
        return RowDecision::Failed(RowFailure::MissingUserId);
    };

    // 首次出现的行生效，重复行整行失败
    if !processed.insert(user_id.clone()) {
        return RowDecision::Failed(RowFailure::DuplicateInFile(user_id));
    }

    let mut matches = Vec::new();
    for rule in rules {
        let aliases = rule.column_aliases();
        let Some((column, value)) = resolver.resolve_entry(&aliases) else {
            continue;
        };

        match RuleEvaluator::evaluate(rule, value) {
            Ok(true) => matches.push(RuleMatch {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                points: rule.points,
                validity_days: rule.validity_days,
                column: column.to_string(),
                matched_value: display_value(value),
            }),
            Ok(false) => {}
            Err(e) => {
                warn!(rule_id = rule.id, user_id = %user_id, error = %e, "规则评估失败，按不命中处理");
            }
        }
    }

    RowDecision::Process(RowPlan { user_id, matches })
}

/// 导入编排器
pub struct ImportOrchestrator {
    pool: PgPool,
}

impl ImportOrchestrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 执行一个批次的导入
    ///
    /// 整个批次在一个事务内完成：规则快照、已知用户快照、逐行
    /// 落库。任何存储错误都会让事务回滚，批次不产生部分写入。
    #[instrument(skip(self, rows), fields(total_rows = rows.len()))]
    pub async fn run(&self, rows: &[Row], batch_id: i64) -> Result<ImportSummary> {
        let mut tx = self.pool.begin().await?;

        let rules = RuleRepository::list_active_in_tx(&mut tx).await?;
        let mut known_users = UserRepository::load_known_ids_in_tx(&mut tx).await?;

        info!(batch_id, rule_count = rules.len(), "开始处理导入批次");

        let mut summary = ImportSummary::default();
        let mut processed: HashSet<String> = HashSet::new();
        // (user_id, rule_id) 的发放守卫：同一批次内至多一条流水
        let mut granted: HashSet<(String, i64)> = HashSet::new();

        for (index, row) in rows.iter().enumerate() {
            let plan = match plan_row(row, &rules, &mut processed) {
                RowDecision::Process(plan) => plan,
                RowDecision::Failed(reason) => {
                    warn!(batch_id, row = index + 1, ?reason, "行处理失败");
                    summary.failed_rows += 1;
                    continue;
                }
            };

            if known_users.contains(&plan.user_id) {
                UserRepository::touch_in_tx(&mut tx, &plan.user_id).await?;
                summary.existing_users += 1;
            } else {
                UserRepository::create_in_tx(&mut tx, &plan.user_id, None).await?;
                known_users.insert(plan.user_id.clone());
                summary.new_users += 1;
            }

            // 余额基线在事务内读取，行内各条流水按顺序递推
            let mut balance =
                UserRepository::get_available_points_in_tx(&mut tx, &plan.user_id).await?;
            let mut row_points: i64 = 0;

            for m in &plan.matches {
                if !granted.insert((plan.user_id.clone(), m.rule_id)) {
                    continue;
                }

                balance += m.points;
                row_points += m.points;

                let entry = NewLedgerEntry {
                    user_id: plan.user_id.clone(),
                    points: m.points,
                    balance_after: balance,
                    source: LedgerSource::Import,
                    rule_id: Some(m.rule_id),
                    expire_date: m
                        .validity_days
                        .map(|days| Utc::now() + Duration::days(days as i64)),
                    batch_id: Some(batch_id),
                    description: Some(format!(
                        "导入规则「{}」命中：{} = {}",
                        m.rule_name, m.column, m.matched_value
                    )),
                };
                LedgerRepository::create_in_tx(&mut tx, &entry).await?;
            }

            if row_points != 0 {
                UserRepository::apply_points_in_tx(&mut tx, &plan.user_id, row_points).await?;
            }

            // 零命中的行也算成功，用户记录照常创建/刷新
            summary.success_rows += 1;
            summary.total_points += row_points;
        }

        tx.commit().await?;

        info!(
            batch_id,
            success_rows = summary.success_rows,
            failed_rows = summary.failed_rows,
            new_users = summary.new_users,
            total_points = summary.total_points,
            "导入批次处理完成"
        );

        Ok(summary)
    }
}
