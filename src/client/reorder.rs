//! Reorder Engine
//!
//! Translates a drag-and-drop gesture (source task, target lane, target
//! index) into lane splices and the ordering contract sent to the server.
//! A cross-lane move issues both a status change and reorder calls; the
//! backend treats them as independent, idempotent operations, so the two
//! are allowed to race.

use uuid::Uuid;

use crate::client::task_cache::TaskCache;
use crate::shared::{CoreError, CoreResult, TaskStatus};

/// Full new ordering for one touched lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanePlan {
    /// The lane
    pub status: TaskStatus,
    /// Every task id of the lane in its new order
    pub order: Vec<Uuid>,
}

/// A drag gesture resolved against the current lane orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// The dragged task
    pub task_id: Uuid,
    /// Lane the task came from
    pub source: TaskStatus,
    /// Lane the task was dropped into
    pub target: TaskStatus,
    /// Ordering for every lane the gesture touched
    pub lanes: Vec<LanePlan>,
}

impl MovePlan {
    /// Whether the gesture moves the task between lanes
    pub fn is_cross_lane(&self) -> bool {
        self.source != self.target
    }
}

fn splice(mut order: Vec<Uuid>, task_id: Uuid, index: usize) -> Vec<Uuid> {
    order.retain(|id| *id != task_id);
    let index = index.min(order.len());
    order.insert(index, task_id);
    order
}

/// Drives drag-and-drop against a [`TaskCache`]
pub struct ReorderEngine;

impl ReorderEngine {
    /// Resolve a gesture into the new order of every touched lane.
    ///
    /// The source task id is removed from its lane's order; a same-lane
    /// drop splices it back at the target index, a cross-lane drop inserts
    /// it into the target lane's order (the status flip itself happens in
    /// [`ReorderEngine::apply`]). The index is clamped to the lane length.
    pub fn plan(
        cache: &TaskCache,
        task_id: Uuid,
        target: TaskStatus,
        target_index: usize,
    ) -> CoreResult<MovePlan> {
        let task = cache.task(task_id).ok_or_else(|| CoreError::not_found("task"))?;
        let source = task.status;

        let lanes = if source == target {
            vec![LanePlan {
                status: target,
                order: splice(cache.lane_order(source), task_id, target_index),
            }]
        } else {
            let mut source_order = cache.lane_order(source);
            source_order.retain(|id| *id != task_id);
            vec![
                LanePlan {
                    status: source,
                    order: source_order,
                },
                LanePlan {
                    status: target,
                    order: splice(cache.lane_order(target), task_id, target_index),
                },
            ]
        };

        Ok(MovePlan {
            task_id,
            source,
            target,
            lanes,
        })
    }

    /// Apply a plan: local splices first, then the optimistic status
    /// change (cross-lane only) and one reorder call per touched lane.
    ///
    /// A failed status change rolls back through the task cache's own
    /// rollback; a failed reorder is surfaced but the spliced order is
    /// left in place as a soft inconsistency until the next full fetch.
    pub async fn apply(cache: &TaskCache, board_id: Uuid, plan: &MovePlan) -> CoreResult<()> {
        for lane in &plan.lanes {
            cache.apply_lane_order(lane.status, lane.order.clone());
        }

        let status_result = if plan.is_cross_lane() {
            cache.update_task_status(plan.task_id, plan.target).await
        } else {
            Ok(())
        };

        let mut reorder_result = Ok(());
        for lane in &plan.lanes {
            if let Err(e) = cache
                .reorder_column(board_id, lane.status, &lane.order)
                .await
            {
                tracing::warn!(
                    "Reorder of lane {} failed, order left unreverted: {}",
                    lane.status.as_str(),
                    e
                );
                if reorder_result.is_ok() {
                    reorder_result = Err(e);
                }
            }
        }

        status_result?;
        reorder_result
    }

    /// Plan and apply one gesture
    pub async fn drag(
        cache: &TaskCache,
        board_id: Uuid,
        task_id: Uuid,
        target: TaskStatus,
        target_index: usize,
    ) -> CoreResult<()> {
        let plan = Self::plan(cache, task_id, target, target_index)?;
        Self::apply(cache, board_id, &plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_moves_to_front() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(splice(vec![a, b, c], b, 0), vec![b, a, c]);
    }

    #[test]
    fn test_splice_clamps_index() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(splice(vec![a, b], a, 99), vec![b, a]);
    }

    #[test]
    fn test_splice_inserts_missing_id() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(splice(vec![a, b], c, 1), vec![a, c, b]);
    }
}
