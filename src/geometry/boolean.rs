//! Polygon boolean operations by horizontal slab decomposition.
//!
//! Every operand is flattened into straight edges. The plane is cut into horizontal slabs at every
//! vertex and edge-crossing `y`, so inside a slab no two edges cross and each operand's
//! inside/outside state is constant between neighbouring edges. Spans that satisfy the boolean
//! predicate become trapezoids; trapezoids are stitched vertically and finally traced back into
//! closed outlines.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::foundation::core::Point;
use crate::geometry::path::{FillRule, PathBuilder, PathSpec};

const EPS: f64 = 1e-9;
const KEY_SCALE: f64 = 1e6;

/// Boolean operation over a list of operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BoolOp {
    /// Inside any operand.
    Union,
    /// Inside every operand.
    Intersect,
    /// Inside the first operand and outside all others.
    Difference,
}

impl BoolOp {
    fn eval(self, inside: &[bool]) -> bool {
        match self {
            Self::Union => inside.iter().any(|v| *v),
            Self::Intersect => !inside.is_empty() && inside.iter().all(|v| *v),
            Self::Difference => match inside.split_first() {
                Some((first, rest)) => *first && !rest.iter().any(|v| *v),
                None => false,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    winding: i32,
    operand: usize,
}

impl Edge {
    fn x_at(&self, y: f64) -> f64 {
        if y <= self.y0 {
            return self.x0;
        }
        if y >= self.y1 {
            return self.x1;
        }
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

#[derive(Clone, Copy, Debug)]
struct Span {
    left: usize,
    right: usize,
    lx_top: f64,
    rx_top: f64,
    lx_bot: f64,
    rx_bot: f64,
}

#[derive(Clone, Copy, Debug)]
struct Trap {
    left: usize,
    right: usize,
    y_top: f64,
    y_bot: f64,
    lx_top: f64,
    rx_top: f64,
    lx_bot: f64,
    rx_bot: f64,
}

/// Run `op` over `operands`. Each operand is interpreted with its own fill rule; the result is a
/// `nonzero` path, empty when nothing survives.
pub(crate) fn boolean(operands: &[&PathSpec], op: BoolOp, tolerance: f64) -> PathSpec {
    let rules: SmallVec<[FillRule; 4]> = operands.iter().map(|p| p.fill_rule()).collect();
    let edges = collect_edges(operands, tolerance);
    if edges.is_empty() {
        return PathSpec::empty();
    }

    let ys = slab_boundaries(&edges);
    let traps = sweep(&edges, &ys, &rules, op);
    if traps.is_empty() {
        return PathSpec::empty();
    }

    match trace_outlines(&traps) {
        Some(loops) => loops_to_path(&loops),
        None => traps_to_path(&traps),
    }
}

fn collect_edges(operands: &[&PathSpec], tolerance: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (operand, path) in operands.iter().enumerate() {
        for contour in path.flatten(tolerance) {
            if contour.iter().any(|p| !p.is_finite()) {
                continue;
            }
            let n = contour.len();
            for i in 0..n {
                let a = contour[i];
                let b = contour[(i + 1) % n];
                if (a.y - b.y).abs() <= EPS {
                    continue;
                }
                let (top, bot, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
                edges.push(Edge {
                    x0: top.x,
                    y0: top.y,
                    x1: bot.x,
                    y1: bot.y,
                    winding,
                    operand,
                });
            }
        }
    }
    edges
}

fn slab_boundaries(edges: &[Edge]) -> Vec<f64> {
    let mut ys = Vec::with_capacity(edges.len() * 2);
    for e in edges {
        ys.push(e.y0);
        ys.push(e.y1);
    }

    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by(|&a, &b| edges[a].y0.total_cmp(&edges[b].y0));
    for (oi, &i) in order.iter().enumerate() {
        let e = edges[i];
        for &j in &order[oi + 1..] {
            let f = edges[j];
            if f.y0 >= e.y1 {
                break;
            }
            if let Some(y) = crossing_y(&e, &f) {
                ys.push(y);
            }
        }
    }

    ys.sort_by(f64::total_cmp);
    ys.dedup_by(|a, b| (*a - *b).abs() <= EPS);
    ys
}

fn crossing_y(e: &Edge, f: &Edge) -> Option<f64> {
    let (px, py) = (e.x0, e.y0);
    let (rx, ry) = (e.x1 - e.x0, e.y1 - e.y0);
    let (qx, qy) = (f.x0, f.y0);
    let (sx, sy) = (f.x1 - f.x0, f.y1 - f.y0);

    let denom = rx * sy - ry * sx;
    if denom.abs() <= EPS {
        return None;
    }
    let t = ((qx - px) * sy - (qy - py) * sx) / denom;
    let u = ((qx - px) * ry - (qy - py) * rx) / denom;
    if t > EPS && t < 1.0 - EPS && u > EPS && u < 1.0 - EPS {
        Some(py + t * ry)
    } else {
        None
    }
}

fn sweep(edges: &[Edge], ys: &[f64], rules: &[FillRule], op: BoolOp) -> Vec<Trap> {
    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by(|&a, &b| edges[a].y0.total_cmp(&edges[b].y0));

    let mut next = 0usize;
    let mut active: Vec<usize> = Vec::new();
    let mut open: Vec<Trap> = Vec::new();
    let mut done: Vec<Trap> = Vec::new();
    let mut winding: SmallVec<[i32; 4]> = SmallVec::from_elem(0, rules.len());
    let mut inside: SmallVec<[bool; 4]> = SmallVec::from_elem(false, rules.len());

    for w in ys.windows(2) {
        let (ya, yb) = (w[0], w[1]);
        if yb - ya <= EPS {
            continue;
        }
        let ym = 0.5 * (ya + yb);

        while next < order.len() && edges[order[next]].y0 <= ya + EPS {
            active.push(order[next]);
            next += 1;
        }
        active.retain(|&i| edges[i].y1 > ya + EPS);

        let mut slab: Vec<(usize, f64, f64, f64)> = active
            .iter()
            .filter(|&&i| edges[i].y0 <= ym && edges[i].y1 >= ym)
            .map(|&i| {
                let e = &edges[i];
                (i, e.x_at(ya), e.x_at(yb), e.x_at(ym))
            })
            .collect();
        slab.sort_by(|a, b| a.3.total_cmp(&b.3).then(a.0.cmp(&b.0)));

        winding.iter_mut().for_each(|w| *w = 0);
        let mut spans: Vec<Span> = Vec::new();
        let mut was_inside = false;
        let mut left: Option<(usize, f64, f64)> = None;
        for &(i, xa, xb, _) in &slab {
            let e = &edges[i];
            winding[e.operand] += e.winding;
            for (k, rule) in rules.iter().enumerate() {
                inside[k] = rule.is_inside(winding[k]);
            }
            let now_inside = op.eval(&inside);
            if now_inside && !was_inside {
                left = Some((i, xa, xb));
            } else if !now_inside && was_inside {
                if let Some((l, lxa, lxb)) = left.take() {
                    push_span(
                        &mut spans,
                        Span {
                            left: l,
                            right: i,
                            lx_top: lxa,
                            rx_top: xa,
                            lx_bot: lxb,
                            rx_bot: xb,
                        },
                    );
                }
            }
            was_inside = now_inside;
        }

        let mut still_open = Vec::with_capacity(spans.len());
        for s in spans {
            let pos = open.iter().position(|t| {
                t.left == s.left && t.right == s.right && (t.y_bot - ya).abs() <= EPS
            });
            match pos {
                Some(p) => {
                    let mut t = open.swap_remove(p);
                    t.y_bot = yb;
                    t.lx_bot = s.lx_bot;
                    t.rx_bot = s.rx_bot;
                    still_open.push(t);
                }
                None => still_open.push(Trap {
                    left: s.left,
                    right: s.right,
                    y_top: ya,
                    y_bot: yb,
                    lx_top: s.lx_top,
                    rx_top: s.rx_top,
                    lx_bot: s.lx_bot,
                    rx_bot: s.rx_bot,
                }),
            }
        }
        done.append(&mut open);
        open = still_open;
    }
    done.append(&mut open);

    done.sort_by(|a, b| {
        a.y_top
            .total_cmp(&b.y_top)
            .then(a.lx_top.total_cmp(&b.lx_top))
            .then(a.left.cmp(&b.left))
    });
    done
}

fn push_span(spans: &mut Vec<Span>, s: Span) {
    if (s.rx_top - s.lx_top).abs() <= EPS && (s.rx_bot - s.lx_bot).abs() <= EPS {
        return;
    }
    if let Some(last) = spans.last_mut() {
        if (last.rx_top - s.lx_top).abs() <= EPS && (last.rx_bot - s.lx_bot).abs() <= EPS {
            last.right = s.right;
            last.rx_top = s.rx_top;
            last.rx_bot = s.rx_bot;
            return;
        }
    }
    spans.push(s);
}

type Key = (i64, i64);

fn key(p: Point) -> Key {
    (
        (p.x * KEY_SCALE).round() as i64,
        (p.y * KEY_SCALE).round() as i64,
    )
}

/// Turn trapezoids into closed outlines: trapezoid sides plus the horizontal pieces where the
/// covered intervals above and below a slab boundary differ. Returns `None` if the directed
/// segments do not chain into loops, in which case callers fall back to raw trapezoids.
fn trace_outlines(traps: &[Trap]) -> Option<Vec<Vec<Point>>> {
    let mut segs: Vec<(Point, Point)> = Vec::new();
    let mut push = |a: Point, b: Point| {
        if key(a) != key(b) {
            segs.push((a, b));
        }
    };

    for t in traps {
        push(Point::new(t.rx_top, t.y_top), Point::new(t.rx_bot, t.y_bot));
        push(Point::new(t.lx_bot, t.y_bot), Point::new(t.lx_top, t.y_top));
    }

    let mut levels: BTreeMap<i64, (f64, Vec<(f64, f64)>, Vec<(f64, f64)>)> = BTreeMap::new();
    for t in traps {
        let e = levels
            .entry(key(Point::new(0.0, t.y_bot)).1)
            .or_insert_with(|| (t.y_bot, Vec::new(), Vec::new()));
        e.1.push((t.lx_bot, t.rx_bot));
        let e = levels
            .entry(key(Point::new(0.0, t.y_top)).1)
            .or_insert_with(|| (t.y_top, Vec::new(), Vec::new()));
        e.2.push((t.lx_top, t.rx_top));
    }
    for (y, above, below) in levels.values() {
        for (x0, x1) in subtract_intervals(above, below) {
            push(Point::new(x1, *y), Point::new(x0, *y));
        }
        for (x0, x1) in subtract_intervals(below, above) {
            push(Point::new(x0, *y), Point::new(x1, *y));
        }
    }

    let mut outgoing: BTreeMap<Key, Vec<usize>> = BTreeMap::new();
    for (i, (a, _)) in segs.iter().enumerate() {
        outgoing.entry(key(*a)).or_default().push(i);
    }

    let mut used = vec![false; segs.len()];
    let mut loops = Vec::new();
    for start in 0..segs.len() {
        if used[start] {
            continue;
        }
        let origin = key(segs[start].0);
        let mut pts = vec![segs[start].0];
        let mut cur = start;
        loop {
            used[cur] = true;
            let end = segs[cur].1;
            if key(end) == origin {
                break;
            }
            pts.push(end);
            let next = outgoing
                .get(&key(end))
                .and_then(|c| c.iter().copied().find(|&i| !used[i]))?;
            cur = next;
        }
        let pts = simplify_loop(pts);
        if pts.len() > 2 {
            loops.push(pts);
        }
    }
    Some(loops)
}

/// Parts of `a` not covered by `b`. Both inputs are lists of `[x0, x1]` intervals.
fn subtract_intervals(a: &[(f64, f64)], b: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut a: Vec<(f64, f64)> = a.to_vec();
    let mut b: Vec<(f64, f64)> = b.to_vec();
    a.sort_by(|p, q| p.0.total_cmp(&q.0));
    b.sort_by(|p, q| p.0.total_cmp(&q.0));

    let mut out = Vec::new();
    for (mut lo, hi) in a {
        for &(blo, bhi) in &b {
            if bhi <= lo + EPS {
                continue;
            }
            if blo >= hi - EPS {
                break;
            }
            if blo > lo + EPS {
                out.push((lo, blo));
            }
            lo = lo.max(bhi);
            if lo >= hi - EPS {
                break;
            }
        }
        if hi - lo > EPS {
            out.push((lo, hi));
        }
    }
    out
}

fn simplify_loop(pts: Vec<Point>) -> Vec<Point> {
    let n = pts.len();
    if n < 3 {
        return pts;
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = pts[(i + n - 1) % n];
        let cur = pts[i];
        let next = pts[(i + 1) % n];
        let d1 = cur - prev;
        let d2 = next - cur;
        let cross = d1.x * d2.y - d1.y * d2.x;
        let scale = d1.hypot() * d2.hypot();
        if scale > 0.0 && cross.abs() <= 1e-9 * scale && d1.dot(d2) > 0.0 {
            continue;
        }
        out.push(cur);
    }
    out
}

fn loops_to_path(loops: &[Vec<Point>]) -> PathSpec {
    let mut b = PathBuilder::new(FillRule::NonZero);
    for l in loops {
        for (i, p) in l.iter().enumerate() {
            if i == 0 {
                b.move_to(*p);
            } else {
                b.line_to(*p);
            }
        }
        b.close();
    }
    b.build()
}

fn traps_to_path(traps: &[Trap]) -> PathSpec {
    let mut b = PathBuilder::new(FillRule::NonZero);
    for t in traps {
        b.move_to((t.lx_top, t.y_top))
            .line_to((t.rx_top, t.y_top))
            .line_to((t.rx_bot, t.y_bot))
            .line_to((t.lx_bot, t.y_bot))
            .close();
    }
    b.build()
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/boolean.rs"]
mod tests;
