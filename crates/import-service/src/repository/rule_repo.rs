//! 积分规则仓储
//!
//! 导入核心对规则只读。每个批次开始时取一次启用规则的快照，
//! 批次内不再感知规则变更。

use chrono::{DateTime, Utc};
use livepoints_rule_engine::{ConditionType, PointRule};
use sqlx::{PgConnection, PgPool};
use tracing::warn;

use crate::error::Result;

/// 规则行（数据库查询结果，condition_type 尚未解析）
#[derive(sqlx::FromRow)]
struct RuleRow {
    id: i64,
    name: String,
    column_name: String,
    condition_type: String,
    condition_value: String,
    points: i64,
    validity_days: Option<i32>,
    priority: i32,
    enabled: bool,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl RuleRow {
    /// 转换为规则引擎模型
    ///
    /// 未知 condition_type 返回 None，由调用方跳过并告警，
    /// 不让单条脏规则阻断整个批次。
    fn into_rule(self) -> Option<PointRule> {
        let Some(condition_type) = ConditionType::parse(&self.condition_type) else {
            warn!(
                rule_id = self.id,
                condition_type = %self.condition_type,
                "跳过未知条件类型的规则"
            );
            return None;
        };

        Some(PointRule {
            id: self.id,
            name: self.name,
            column_name: self.column_name,
            condition_type,
            condition_value: self.condition_value,
            points: self.points,
            validity_days: self.validity_days,
            priority: self.priority,
            enabled: self.enabled,
        })
    }
}

/// 积分规则仓储
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 列出启用的规则，按优先级降序、ID 升序
    ///
    /// 排序即评估顺序，编排器按此顺序逐条评估。
    pub async fn list_active(&self) -> Result<Vec<PointRule>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            r#"
            SELECT id, name, column_name, condition_type, condition_value,
                   points, validity_days, priority, enabled, created_at
            FROM point_rules
            WHERE enabled = TRUE
            ORDER BY priority DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(RuleRow::into_rule).collect())
    }

    /// 在事务中列出启用的规则（批次快照在导入事务内读取）
    pub async fn list_active_in_tx(tx: &mut PgConnection) -> Result<Vec<PointRule>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            r#"
            SELECT id, name, column_name, condition_type, condition_value,
                   points, validity_days, priority, enabled, created_at
            FROM point_rules
            WHERE enabled = TRUE
            ORDER BY priority DESC, id ASC
            "#,
        )
        .fetch_all(tx)
        .await?;

        Ok(rows.into_iter().filter_map(RuleRow::into_rule).collect())
    }
}
