//! Order registry: the three indexed relations the matching loop and
//! linkage management read and mutate. Kept as flat maps rather than
//! back-pointers per the "OCO/atomic as indexed relations" design note —
//! membership in these maps is the single source of truth.

use indexmap::IndexMap;

use crate::order::{Order, OrderId};

#[derive(Debug, Default)]
pub struct OrderRegistry {
    /// Orders accepted and not yet terminal. Insertion order drives
    /// matching-loop determinism (§4.1/§5).
    pub working_orders: IndexMap<OrderId, Order>,
    /// `parent_order_id -> ordered list of child orders` (stop-loss first,
    /// optional take-profit second). Children live here, not in
    /// `working_orders`, until the parent fills (invariant 3).
    pub atomic_children: IndexMap<OrderId, Vec<Order>>,
    /// Symmetric OCO map: if `a -> b` is present then `b -> a` is too.
    pub oco_pairs: IndexMap<OrderId, OrderId>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a symmetric OCO pair. Never inserts a self-pair.
    pub fn link_oco(&mut self, a: OrderId, b: OrderId) {
        debug_assert_ne!(a, b, "OCO map must never contain self-pairs");
        self.oco_pairs.insert(a.clone(), b.clone());
        self.oco_pairs.insert(b, a);
    }

    /// Remove both sides of the OCO pair `id` participates in, if any,
    /// returning the partner id.
    pub fn unlink_oco(&mut self, id: &OrderId) -> Option<OrderId> {
        let partner = self.oco_pairs.shift_remove(id)?;
        self.oco_pairs.shift_remove(&partner);
        Some(partner)
    }

    pub fn oco_partner(&self, id: &OrderId) -> Option<&OrderId> {
        self.oco_pairs.get(id)
    }

    /// `_clean_up_children(id)`: erase `atomic_children[id]` if present.
    pub fn clean_up_children(&mut self, parent_id: &OrderId) -> Option<Vec<Order>> {
        self.atomic_children.shift_remove(parent_id)
    }

    pub fn is_atomic_parent(&self, id: &OrderId) -> bool {
        self.atomic_children.contains_key(id)
    }

    #[cfg(test)]
    pub fn assert_oco_symmetric(&self) {
        for (a, b) in self.oco_pairs.iter() {
            assert_eq!(self.oco_pairs.get(b), Some(a), "OCO map not symmetric for {a}/{b}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::order::{OrderType, Side};

    fn stub_order(id: &str) -> Order {
        Order::new(OrderId::from(id), "EURUSD", Side::Buy, OrderType::Limit, dec!(1000), Some(dec!(1.1)))
    }

    #[test]
    fn link_oco_is_symmetric() {
        let mut registry = OrderRegistry::new();
        registry.link_oco(OrderId::from("a"), OrderId::from("b"));
        assert_eq!(registry.oco_partner(&OrderId::from("a")), Some(&OrderId::from("b")));
        assert_eq!(registry.oco_partner(&OrderId::from("b")), Some(&OrderId::from("a")));
        registry.assert_oco_symmetric();
    }

    #[test]
    fn unlink_oco_removes_both_sides() {
        let mut registry = OrderRegistry::new();
        registry.link_oco(OrderId::from("a"), OrderId::from("b"));
        let partner = registry.unlink_oco(&OrderId::from("a"));
        assert_eq!(partner, Some(OrderId::from("b")));
        assert!(registry.oco_partner(&OrderId::from("a")).is_none());
        assert!(registry.oco_partner(&OrderId::from("b")).is_none());
    }

    #[test]
    fn children_never_enter_working_orders_directly() {
        let mut registry = OrderRegistry::new();
        registry
            .atomic_children
            .insert(OrderId::from("parent"), vec![stub_order("sl"), stub_order("tp")]);
        assert!(registry.is_atomic_parent(&OrderId::from("parent")));
        assert!(!registry.working_orders.contains_key(&OrderId::from("sl")));
        let children = registry.clean_up_children(&OrderId::from("parent")).unwrap();
        assert_eq!(children.len(), 2);
        assert!(!registry.is_atomic_parent(&OrderId::from("parent")));
    }
}
