use serde::{
    Deserialize,
    Serialize
};
use tracing::debug;
use uuid::Uuid;

use crate::math::curve::nonparametriccurve::nonparametriccurve::Point2D;
use crate::revision::Revisioned;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub fixed: bool,
}

impl ControlPoint {
    pub fn new(x: f64, y: f64) -> ControlPoint {
        ControlPoint { x, y, fixed: false }
    }

    pub fn fixed(x: f64, y: f64) -> ControlPoint {
        ControlPoint { x, y, fixed: true }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Draggable points of a monotone relationship, kept sorted by `x`.
///
/// Mutations that would move or delete a fixed point, introduce a
/// non-finite coordinate, repeat an `x` or make `y` decrease are refused:
/// the method returns `false` and the set is left untouched. Every accepted
/// mutation issues a new revision.
#[derive(Debug, Clone)]
pub struct ControlPointSet {
    points: Vec<ControlPoint>,
    revision: Uuid,
}

impl ControlPointSet {
    /// 依 `x` 排序 `points`，呼叫端不需先排序。
    pub fn new(mut points: Vec<ControlPoint>) -> ControlPointSet {
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        ControlPointSet { points, revision: Uuid::new_v4() }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ControlPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ControlPoint> {
        self.points.last()
    }

    pub(crate) fn to_point2d(&self) -> Vec<Point2D> {
        self.points.iter().map(|p| Point2D::new(p.x, p.y)).collect()
    }

    /// Strictly increasing `x`, non-decreasing `y`, all finite.
    pub fn is_monotone(&self) -> bool {
        self.points.iter().all(ControlPoint::is_finite)
            && self.points.windows(2).all(|w| w[1].x > w[0].x && w[1].y >= w[0].y)
    }

    pub fn move_point(&mut self, index: usize, x: f64, y: f64) -> bool {
        let Some(current) = self.points.get(index) else {
            return false;
        };
        if current.fixed {
            debug!(index, "refused drag of a fixed control point");
            return false;
        }
        let candidate = ControlPoint { x, y, fixed: false };
        if !candidate.is_finite() || !self.fits_between(index, &candidate) {
            debug!(index, x, y, "refused drag breaking monotone order");
            return false;
        }
        self.points[index] = candidate;
        self.bump();
        true
    }

    pub fn insert_point(&mut self, point: ControlPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        let index = self.points.partition_point(|p| p.x < point.x);
        if self.points.get(index).is_some_and(|p| p.x == point.x) {
            return false;
        }
        // 插入位置的相鄰點為 index-1 與 index
        let prev_ok = index == 0 || self.points[index - 1].y <= point.y;
        let next_ok = self.points.get(index).is_none_or(|p| point.y <= p.y);
        if !(prev_ok && next_ok) {
            debug!(x = point.x, y = point.y, "refused insertion breaking monotone order");
            return false;
        }
        self.points.insert(index, point);
        self.bump();
        true
    }

    pub fn remove_point(&mut self, index: usize) -> Option<ControlPoint> {
        match self.points.get(index) {
            Some(p) if !p.fixed => {
                let removed = self.points.remove(index);
                self.bump();
                Some(removed)
            }
            _ => None,
        }
    }

    /// 整組替換控制點，保留目前的固定點。結果不單調時拒絕。
    pub fn replace(&mut self, points: Vec<ControlPoint>) -> bool {
        let mut merged: Vec<ControlPoint> = self.points.iter().copied().filter(|p| p.fixed).collect();
        merged.extend(points.into_iter().filter(|p| !p.fixed));
        let candidate = ControlPointSet::new(merged);
        if !candidate.is_monotone() {
            return false;
        }
        self.points = candidate.points;
        self.bump();
        true
    }

    fn fits_between(&self, index: usize, candidate: &ControlPoint) -> bool {
        let prev = index.checked_sub(1).map(|i| &self.points[i]);
        let next = self.points.get(index + 1);
        prev.is_none_or(|p| p.x < candidate.x && p.y <= candidate.y)
            && next.is_none_or(|p| candidate.x < p.x && candidate.y <= p.y)
    }

    fn bump(&mut self) {
        self.revision = Uuid::new_v4();
    }
}

impl Revisioned for ControlPointSet {
    fn revision(&self) -> Uuid {
        self.revision
    }
}
