use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::transaction_entity as transactions;
use crate::error::{AppError, AppResult};
use crate::models::{
    CursorPage, CursorParams, PaginatedResponse, PaginationParams, TransactionQuery,
    TransactionResponse,
};

#[derive(Clone)]
pub struct TransactionService {
    pool: DatabaseConnection,
    default_page_size: u64,
}

impl TransactionService {
    pub fn new(pool: DatabaseConnection, default_page_size: u64) -> Self {
        Self {
            pool,
            default_page_size,
        }
    }

    /// 顾客的支付记录，与预约列表相同的游标规则
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        params: &CursorParams,
    ) -> AppResult<CursorPage<TransactionResponse>> {
        let limit = params.get_limit(self.default_page_size);
        let mut query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));

        if let Some(cursor) = params.cursor {
            let anchor = transactions::Entity::find_by_id(cursor)
                .filter(transactions::Column::UserId.eq(user_id))
                .one(&self.pool)
                .await?
                .ok_or_else(|| {
                    AppError::ValidationError(
                        "Cursor no longer valid, restart from the first page".into(),
                    )
                })?;
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::CreatedAt.lt(anchor.created_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CreatedAt.eq(anchor.created_at))
                            .add(transactions::Column::Id.lt(anchor.id)),
                    ),
            );
        }

        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit + 1)
            .all(&self.pool)
            .await?;

        Ok(CursorPage::from_rows(rows, limit, |m| m.id, Into::into))
    }

    /// 全部交易（商家）
    pub async fn list_all(
        &self,
        query: &TransactionQuery,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = transactions::Entity::find();
        if let Some(status) = query.status {
            base = base.filter(transactions::Column::Status.eq(status));
        }

        let total = base.clone().count(&self.pool).await?;
        let rows = base
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }
}
