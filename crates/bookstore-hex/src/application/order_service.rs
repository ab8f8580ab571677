use crate::config::Config;
use crate::errors::AppError;
use bookstore_types::domain::order::{Order, OrderStatus, PaymentMethod, ShippingAddress};
use bookstore_types::domain::user::Principal;
use bookstore_types::ports::order_repository::OrderScope;
use bookstore_types::ports::Store;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::bounded;
use super::cart_service::resolve_lines;
use super::user_locks::UserLocks;

const CART_CLEAR_ATTEMPTS: u32 = 2;

pub struct OrderService<S: Store> {
    store: Arc<S>,
    locks: UserLocks,
    deadline: Duration,
    owner_status_updates: bool,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>, locks: UserLocks, config: &Config) -> Self {
        Self {
            store,
            locks,
            deadline: config.store_timeout,
            owner_status_updates: config.owner_status_updates,
        }
    }

    /// Turns the user's current cart into an order and empties the cart.
    ///
    /// Returns `Ok(None)` when the cart is empty; nothing is persisted then.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        shipping_address: ShippingAddress,
        payment_method: &str,
    ) -> Result<Option<Order>, AppError> {
        let payment_method: PaymentMethod = payment_method.parse()?;
        let shipping_address = shipping_address.validated()?;

        // Held until the cart is cleared: one cart snapshot feeds at most one order.
        let _guard = self.locks.lock(user_id).await;
        let lines = bounded(self.deadline, self.store.cart_lines(user_id)).await?;
        let items = resolve_lines(self.store.as_ref(), self.deadline, lines).await?;
        if items.is_empty() {
            tracing::debug!(%user_id, "order not created: cart is empty");
            return Ok(None);
        }

        let order = Order::place(user_id, &items, shipping_address, payment_method)?;
        let order = bounded(self.deadline, self.store.create(order)).await?;
        tracing::info!(
            order_id = %order.id,
            %user_id,
            total_amount_cents = order.total_amount_cents,
            lines = order.items.len(),
            "order placed"
        );

        self.clear_cart_after_order(user_id, order.id).await?;
        Ok(Some(order))
    }

    // Clearing is idempotent, so a failed attempt can simply be repeated.
    async fn clear_cart_after_order(&self, user_id: Uuid, order_id: Uuid) -> Result<(), AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match bounded(self.deadline, self.store.clear(user_id)).await {
                Ok(_) => return Ok(()),
                Err(e) if attempt < CART_CLEAR_ATTEMPTS => {
                    tracing::warn!(%user_id, %order_id, attempt, error = %e, "cart clear failed, retrying");
                }
                Err(e) => {
                    tracing::error!(
                        kind = "cart_clear_failed",
                        %user_id,
                        %order_id,
                        attempt,
                        error = %e,
                        "order persisted but cart was not cleared"
                    );
                    return Err(AppError::Internal(anyhow::anyhow!(
                        "cart_clear_failed: order {order_id} was placed but the cart of user {user_id} was not cleared: {e}"
                    )));
                }
            }
        }
    }

    /// The user's own orders, newest first.
    pub async fn get_orders(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        bounded(self.deadline, self.store.list(OrderScope::Owner(user_id))).await
    }

    /// Every order in the system, newest first. Admin only.
    pub async fn list_all_orders(&self, principal: &Principal) -> Result<Vec<Order>, AppError> {
        if !principal.is_admin() {
            return Err(forbidden());
        }
        bounded(self.deadline, self.store.list(OrderScope::Any)).await
    }

    /// Owners see their own orders; admins see any. A non-owner gets the same
    /// `NotFound` as for a missing id.
    pub async fn get_order_by_id(
        &self,
        principal: &Principal,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let scope = read_scope(principal);
        bounded(self.deadline, self.store.get(order_id, scope))
            .await?
            .ok_or_else(|| not_found(order_id))
    }

    /// Sets any of the four statuses; no transition order is enforced.
    pub async fn update_order_status(
        &self,
        principal: &Principal,
        order_id: Uuid,
        status: &str,
    ) -> Result<Order, AppError> {
        let scope = if principal.is_admin() {
            OrderScope::Any
        } else if self.owner_status_updates {
            OrderScope::Owner(principal.user_id)
        } else {
            return Err(forbidden());
        };
        let status: OrderStatus = status.parse()?;

        let order = bounded(
            self.deadline,
            self.store.update_status(order_id, scope, status),
        )
        .await?
        .ok_or_else(|| not_found(order_id))?;
        tracing::info!(%order_id, status = %order.status, by = %principal.user_id, "order status updated");
        Ok(order)
    }
}

fn read_scope(principal: &Principal) -> OrderScope {
    if principal.is_admin() {
        OrderScope::Any
    } else {
        OrderScope::Owner(principal.user_id)
    }
}

fn forbidden() -> AppError {
    AppError::Forbidden("You do not have permission to perform this action".into())
}

fn not_found(order_id: Uuid) -> AppError {
    AppError::NotFound(format!("order {}", order_id))
}
