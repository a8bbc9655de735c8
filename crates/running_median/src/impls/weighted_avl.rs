use std::fmt;

use tracing::{debug, trace};

use crate::error::InvariantViolation;
use crate::policy::{Ascending, Comparator, Midpoint};
use crate::traits::RunningMedian;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Id(u32);

impl Id {
    const NIL: Self = Self(u32::MAX);

    #[inline(always)]
    fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline(always)]
    fn idx(self) -> usize {
        self.0 as usize
    }

    fn slot(self) -> Option<usize> {
        (!self.is_nil()).then_some(self.idx())
    }
}

#[inline(always)]
fn id(v: usize) -> Id {
    debug_assert!(v < u32::MAX as usize);
    Id(v as u32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// How the tree keeps itself balanced, and therefore how it answers median queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BalanceMode {
    /// Height and subtree-size balance at every node. The median is read at the root
    /// in O(log n); inserts pay for weight shifts.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "weighted"))]
    WeightBalanced,
    /// Plain AVL. Inserts only rotate; the median is found by an O(n) in-order walk.
    HeightOnly,
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    height: i32,
    size: u32,
    left: Id,
    right: Id,
    parent: Id,
}

impl<T> Node<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            height: 0,
            size: 1,
            left: Id::NIL,
            right: Id::NIL,
            parent: Id::NIL,
        }
    }

    #[inline(always)]
    fn child(&self, side: Side) -> Id {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline(always)]
    fn child_mut(&mut self, side: Side) -> &mut Id {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// AVL tree that also keeps every pair of sibling subtrees within one element of each
/// other, so the median always sits at (or next to) the root.
///
/// Nodes live in an arena and refer to each other by index; the parent index is only
/// used for navigation. Duplicates are kept as separate nodes.
///
/// In [`BalanceMode::WeightBalanced`] a single insert may cascade into a weight shift at
/// every level, and each shift repairs a whole root-to-leaf path below it. An insert
/// is Θ(n) in the worst case, and sorted input hits it: building from an ascending
/// stream is quadratic overall. Use [`BalanceMode::HeightOnly`] when inserts dominate.
#[derive(Clone)]
pub struct MedianTree<T, C = Ascending> {
    nodes: Vec<Node<T>>,
    root: Id,
    len: usize,
    compare: C,
    mode: BalanceMode,
}

impl<T, C: Comparator<T> + Default> MedianTree<T, C> {
    pub fn new() -> Self {
        Self::with_comparator(C::default(), BalanceMode::default())
    }

    pub fn with_mode(mode: BalanceMode) -> Self {
        Self::with_comparator(C::default(), mode)
    }

    /// Empty tree in the default mode with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, C::default(), BalanceMode::default())
    }
}

impl<T, C: Comparator<T> + Default> Default for MedianTree<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Comparator<T>> MedianTree<T, C> {
    pub fn with_comparator(compare: C, mode: BalanceMode) -> Self {
        Self::with_capacity_and_comparator(0, compare, mode)
    }

    /// Preallocates the arena; nothing is reallocated until `capacity` elements are stored.
    pub fn with_capacity_and_comparator(capacity: usize, compare: C, mode: BalanceMode) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: Id::NIL,
            len: 0,
            compare,
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mode(&self) -> BalanceMode {
        self.mode
    }

    pub fn comparator(&self) -> &C {
        &self.compare
    }

    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    pub fn insert(&mut self, value: T) {
        self.len += 1;
        let leaf = self.alloc(value);
        if self.root.is_nil() {
            self.attach(Id::NIL, Side::Left, leaf);
            return;
        }
        let parent = self.place_leaf(self.root, leaf);
        self.rebalance_path(parent, Id::NIL);
    }

    pub fn clear(&mut self) {
        debug!(discarded = self.len, mode = ?self.mode, "clearing median tree");
        self.nodes.clear();
        self.root = Id::NIL;
        self.len = 0;
    }

    /// The two middle elements in comparator order; both refer to the same element
    /// when the count is odd.
    pub fn median_pair(&self) -> Option<(&T, &T)> {
        if self.len == 0 {
            return None;
        }
        let (lo, hi) = match self.mode {
            BalanceMode::WeightBalanced => self.middle_by_weight(),
            BalanceMode::HeightOnly => self.middle_by_walk(),
        };
        Some((&self.node(lo).value, &self.node(hi).value))
    }

    /// In-order iterator over the stored values.
    pub fn iter(&self) -> Iter<'_, T, C> {
        let (front, back) = if self.root.is_nil() {
            (Id::NIL, Id::NIL)
        } else {
            (self.first(self.root), self.last(self.root))
        };
        Iter {
            tree: self,
            front,
            back,
            remaining: self.len,
        }
    }

    fn middle_by_weight(&self) -> (Id, Id) {
        let root = self.root;
        if self.len % 2 == 1 {
            return (root, root);
        }
        if self.size(self.node(root).left) > self.size(self.node(root).right) {
            (self.prev(root), root)
        } else {
            (root, self.next(root))
        }
    }

    fn middle_by_walk(&self) -> (Id, Id) {
        let mut lo = self.first(self.root);
        for _ in 0..(self.len - 1) / 2 {
            lo = self.next(lo);
        }
        let hi = if self.len % 2 == 1 { lo } else { self.next(lo) };
        (lo, hi)
    }

    #[inline(always)]
    fn node(&self, x: Id) -> &Node<T> {
        debug_assert!(!x.is_nil());
        &self.nodes[x.idx()]
    }

    #[inline(always)]
    fn node_mut(&mut self, x: Id) -> &mut Node<T> {
        debug_assert!(!x.is_nil());
        &mut self.nodes[x.idx()]
    }

    fn alloc(&mut self, value: T) -> Id {
        let x = id(self.nodes.len());
        self.nodes.push(Node::new(value));
        x
    }

    #[inline(always)]
    fn height(&self, x: Id) -> i32 {
        if x.is_nil() { -1 } else { self.node(x).height }
    }

    #[inline(always)]
    fn size(&self, x: Id) -> u32 {
        if x.is_nil() { 0 } else { self.node(x).size }
    }

    #[inline(always)]
    fn child(&self, x: Id, side: Side) -> Id {
        self.node(x).child(side)
    }

    #[inline(always)]
    fn parent(&self, x: Id) -> Id {
        self.node(x).parent
    }

    fn balance_factor(&self, x: Id) -> i32 {
        let node = self.node(x);
        self.height(node.left) - self.height(node.right)
    }

    fn update(&mut self, x: Id) {
        let (left, right) = {
            let node = self.node(x);
            (node.left, node.right)
        };
        let height = 1 + self.height(left).max(self.height(right));
        let size = self.size(left) + 1 + self.size(right);
        let node = self.node_mut(x);
        node.height = height;
        node.size = size;
    }

    fn extreme(&self, mut x: Id, side: Side) -> Id {
        loop {
            let child = self.child(x, side);
            if child.is_nil() {
                return x;
            }
            x = child;
        }
    }

    fn first(&self, x: Id) -> Id {
        self.extreme(x, Side::Left)
    }

    fn last(&self, x: Id) -> Id {
        self.extreme(x, Side::Right)
    }

    /// In-order neighbour of `x` on `side`, or nil past the end.
    fn step(&self, x: Id, side: Side) -> Id {
        let child = self.child(x, side);
        if !child.is_nil() {
            return self.extreme(child, side.opposite());
        }
        let mut cur = x;
        let mut parent = self.parent(cur);
        while !parent.is_nil() && self.child(parent, side) == cur {
            cur = parent;
            parent = self.parent(cur);
        }
        parent
    }

    fn next(&self, x: Id) -> Id {
        self.step(x, Side::Right)
    }

    fn prev(&self, x: Id) -> Id {
        self.step(x, Side::Left)
    }

    /// Parent of `x` and the slot it occupies there. The root reports a nil parent.
    fn slot_of(&self, x: Id) -> (Id, Side) {
        let parent = self.parent(x);
        if parent.is_nil() || self.child(parent, Side::Left) == x {
            (parent, Side::Left)
        } else {
            (parent, Side::Right)
        }
    }

    /// Unlinks `x` from its parent slot and refreshes the parent's cached height and size.
    /// Older ancestors are left for the rebalancing walk.
    fn detach(&mut self, x: Id) {
        let (parent, side) = self.slot_of(x);
        if parent.is_nil() {
            if self.root == x {
                self.root = Id::NIL;
            }
        } else {
            *self.node_mut(parent).child_mut(side) = Id::NIL;
            self.update(parent);
        }
        self.node_mut(x).parent = Id::NIL;
    }

    /// Links `child` (possibly nil) into an empty slot; a nil `parent` means the root.
    fn attach(&mut self, parent: Id, side: Side, child: Id) {
        if parent.is_nil() {
            debug_assert!(self.root.is_nil());
            self.root = child;
        } else {
            debug_assert!(self.child(parent, side).is_nil());
            *self.node_mut(parent).child_mut(side) = child;
        }
        if !child.is_nil() {
            self.node_mut(child).parent = parent;
        }
        if !parent.is_nil() {
            self.update(parent);
        }
    }

    /// Promotes the child of `x` on `heavy` into the slot of `x` and returns it.
    fn rotate(&mut self, x: Id, heavy: Side) -> Id {
        let light = heavy.opposite();
        let promoted = self.child(x, heavy);
        debug_assert!(!promoted.is_nil());
        let (parent, side) = self.slot_of(x);
        let inner = self.child(promoted, light);

        self.detach(x);
        self.detach(promoted);
        if !inner.is_nil() {
            self.detach(inner);
        }
        self.attach(x, heavy, inner);
        self.attach(promoted, light, x);
        self.attach(parent, side, promoted);

        trace!(pivot = x.idx(), promoted = promoted.idx(), toward = ?light, "rotate");
        promoted
    }

    /// Descends from `start` to an empty slot for `leaf`, links it there and returns its
    /// new parent. Elements equal to a node go to its right.
    fn place_leaf(&mut self, start: Id, leaf: Id) -> Id {
        let mut cur = start;
        loop {
            let side = if self
                .compare
                .precedes_or_equal(&self.node(cur).value, &self.node(leaf).value)
            {
                Side::Right
            } else {
                Side::Left
            };
            let next = self.child(cur, side);
            if next.is_nil() {
                self.attach(cur, side, leaf);
                return cur;
            }
            cur = next;
        }
    }

    /// Balances every node from `from` upward, stopping before `stop` (nil: the root).
    fn rebalance_path(&mut self, from: Id, stop: Id) {
        let mut cur = from;
        while cur != stop {
            let top = self.balance(cur);
            cur = self.parent(top);
        }
    }

    /// Restores both invariants at `x`, given that its subtrees already satisfy them and
    /// that only one of them changed by one element. Returns the node now in the slot of `x`.
    fn balance(&mut self, x: Id) -> Id {
        self.update(x);

        let factor = self.balance_factor(x);
        let mut top = x;
        if factor > 1 {
            let left = self.node(x).left;
            if self.balance_factor(left) < 0 {
                self.rotate(left, Side::Right);
            }
            top = self.rotate(x, Side::Left);
        } else if factor < -1 {
            let right = self.node(x).right;
            if self.balance_factor(right) > 0 {
                self.rotate(right, Side::Left);
            }
            top = self.rotate(x, Side::Right);
        }

        if self.mode == BalanceMode::WeightBalanced {
            let left = self.size(self.node(top).left);
            let right = self.size(self.node(top).right);
            debug_assert!(left.abs_diff(right) <= 2);
            if left > right + 1 {
                self.shift_weight(top, Side::Left);
            } else if right > left + 1 {
                self.shift_weight(top, Side::Right);
            }
        }
        top
    }

    /// Moves one element from the `heavy` subtree of `x` to the other one.
    ///
    /// The neighbour of `x` on the heavy side is unlinked and takes over the value of `x`;
    /// its node then carries the old value of `x` into the light subtree as a new leaf.
    /// Both repairs stop below `x`.
    fn shift_weight(&mut self, x: Id, heavy: Side) {
        let light = heavy.opposite();
        let moved = self.extreme(self.child(x, heavy), light);
        let orphan = self.child(moved, heavy);
        let (parent, side) = self.slot_of(moved);

        self.detach(moved);
        if !orphan.is_nil() {
            self.detach(orphan);
            self.attach(parent, side, orphan);
        }
        if parent != x {
            self.rebalance_path(parent, x);
        }

        self.swap_values(x, moved);
        self.update(moved);

        let target = self.child(x, light);
        if target.is_nil() {
            self.attach(x, light, moved);
        } else {
            let leaf_parent = self.place_leaf(target, moved);
            self.rebalance_path(leaf_parent, x);
        }
        self.update(x);

        trace!(node = x.idx(), from = ?heavy, "weight shift");
    }

    fn swap_values(&mut self, a: Id, b: Id) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a.idx() < b.idx() { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi.idx());
        std::mem::swap(&mut head[lo.idx()].value, &mut tail[0].value);
    }

    /// Recomputes every cached height and size and checks balance, order, parent links
    /// and the element count.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let size = if self.root.is_nil() {
            0
        } else {
            let parent = self.parent(self.root);
            if !parent.is_nil() {
                return Err(InvariantViolation::BrokenParentLink {
                    node: self.root.idx(),
                    expected: None,
                    found: parent.slot(),
                });
            }
            self.check_subtree(self.root)?.size as usize
        };
        if size != self.len {
            return Err(InvariantViolation::CountMismatch {
                count: self.len,
                size,
            });
        }
        if size != self.nodes.len() {
            return Err(InvariantViolation::LeakedNodes {
                live: self.nodes.len(),
                reachable: size,
            });
        }
        Ok(())
    }

    /// Panics if [`validate`](Self::validate) reports a violation.
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.validate() {
            panic!("median tree invariant violated: {violation}");
        }
    }

    fn check_subtree(&self, x: Id) -> Result<Summary, InvariantViolation> {
        let left = self.check_child(x, Side::Left)?;
        let right = self.check_child(x, Side::Right)?;
        let node = self.node(x);

        let mut low = x;
        let mut high = x;
        if let Some(left) = &left {
            if !self
                .compare
                .precedes_or_equal(&self.node(left.high).value, &node.value)
            {
                return Err(InvariantViolation::OrderViolation {
                    node: x.idx(),
                    side: "left",
                });
            }
            low = self.lower(low, left.low);
            high = self.higher(high, left.high);
        }
        if let Some(right) = &right {
            if !self
                .compare
                .precedes_or_equal(&node.value, &self.node(right.low).value)
            {
                return Err(InvariantViolation::OrderViolation {
                    node: x.idx(),
                    side: "right",
                });
            }
            low = self.lower(low, right.low);
            high = self.higher(high, right.high);
        }

        let (left_height, left_size) = left.map_or((-1, 0), |s| (s.height, s.size));
        let (right_height, right_size) = right.map_or((-1, 0), |s| (s.height, s.size));
        let height = 1 + left_height.max(right_height);
        let size = left_size + 1 + right_size;

        if node.height != height {
            return Err(InvariantViolation::StaleHeight {
                node: x.idx(),
                cached: node.height,
                actual: height,
            });
        }
        if node.size != size {
            return Err(InvariantViolation::StaleSize {
                node: x.idx(),
                cached: node.size,
                actual: size,
            });
        }
        if (left_height - right_height).abs() > 1 {
            return Err(InvariantViolation::HeightImbalance {
                node: x.idx(),
                left: left_height,
                right: right_height,
            });
        }
        if self.mode == BalanceMode::WeightBalanced && left_size.abs_diff(right_size) > 1 {
            return Err(InvariantViolation::WeightImbalance {
                node: x.idx(),
                left: left_size,
                right: right_size,
            });
        }

        Ok(Summary {
            height,
            size,
            low,
            high,
        })
    }

    fn check_child(&self, x: Id, side: Side) -> Result<Option<Summary>, InvariantViolation> {
        let child = self.child(x, side);
        if child.is_nil() {
            return Ok(None);
        }
        let parent = self.parent(child);
        if parent != x {
            return Err(InvariantViolation::BrokenParentLink {
                node: child.idx(),
                expected: Some(x.idx()),
                found: parent.slot(),
            });
        }
        self.check_subtree(child).map(Some)
    }

    fn lower(&self, a: Id, b: Id) -> Id {
        if self
            .compare
            .precedes_or_equal(&self.node(b).value, &self.node(a).value)
        {
            b
        } else {
            a
        }
    }

    fn higher(&self, a: Id, b: Id) -> Id {
        if self
            .compare
            .precedes_or_equal(&self.node(a).value, &self.node(b).value)
        {
            b
        } else {
            a
        }
    }
}

/// Recomputed facts about a checked subtree; `low`/`high` are its extreme elements.
struct Summary {
    height: i32,
    size: u32,
    low: Id,
    high: Id,
}

impl<T: Midpoint, C: Comparator<T>> RunningMedian for MedianTree<T, C> {
    type Value = T;

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        MedianTree::clear(self);
    }

    fn insert(&mut self, value: T) {
        MedianTree::insert(self, value);
    }

    fn median(&self) -> Option<T> {
        let odd = self.len % 2 == 1;
        self.median_pair().map(|(lo, hi)| {
            if odd {
                lo.clone()
            } else {
                T::midpoint_of(lo, hi)
            }
        })
    }
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for MedianTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T, C> {
    tree: &'a MedianTree<T, C>,
    front: Id,
    back: Id,
    remaining: usize,
}

impl<'a, T, C: Comparator<T>> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let value = &tree.node(self.front).value;
        self.front = tree.next(self.front);
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C: Comparator<T>> DoubleEndedIterator for Iter<'_, T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let value = &tree.node(self.back).value;
        self.back = tree.prev(self.back);
        self.remaining -= 1;
        Some(value)
    }
}

impl<T, C: Comparator<T>> ExactSizeIterator for Iter<'_, T, C> {}

impl<'a, T, C: Comparator<T>> IntoIterator for &'a MedianTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
