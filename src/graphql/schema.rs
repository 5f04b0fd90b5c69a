use async_graphql::{EmptySubscription, Schema};

use super::mutations::MutationRoot;
use super::queries::QueryRoot;

/// GraphQL Schema type
pub type KnitSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema. The gateway and viewer are attached per request.
pub fn build_schema() -> KnitSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}
