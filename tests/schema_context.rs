mod common;

use anyhow::Result;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::PgConnection;

use common::{acquire_db_lock, TestApp};
use polycampus::tenancy::context::with_schema;
use polycampus::tenancy::registry;

#[derive(QueryableByName)]
struct SearchPathRow {
    #[diesel(sql_type = Text, column_name = search_path)]
    search_path: String,
}

fn current_path(conn: &mut PgConnection) -> Result<String> {
    let row: SearchPathRow = diesel::sql_query("SHOW search_path").get_result(conn)?;
    Ok(row.search_path)
}

#[tokio::test]
async fn nested_contexts_restore_the_prior_search_path() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.with_conn(|conn| {
        registry::create_schema(conn, "tenant1")?;
        registry::create_schema(conn, "tenant2")?;
        let initial = current_path(conn)?;

        with_schema(conn, "tenant1", |conn| {
            assert_eq!(current_path(conn)?, "tenant1, public");

            with_schema(conn, "tenant2", |conn| {
                assert_eq!(current_path(conn)?, "tenant2, public");
                Ok::<_, anyhow::Error>(())
            })?;

            // The inner scope hands back the outer schema, not the default.
            assert_eq!(current_path(conn)?, "tenant1, public");
            Ok::<_, anyhow::Error>(())
        })?;

        assert_eq!(current_path(conn)?, initial);
        Ok(())
    })
    .await?;

    app.cleanup().await
}

#[tokio::test]
async fn a_failing_closure_still_restores_the_search_path() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.with_conn(|conn| {
        registry::create_schema(conn, "tenant1")?;
        let initial = current_path(conn)?;

        let result: Result<(), anyhow::Error> =
            with_schema(conn, "tenant1", |_conn| Err(anyhow::anyhow!("boom")));
        assert!(result.is_err());

        assert_eq!(current_path(conn)?, initial);
        Ok(())
    })
    .await?;

    app.cleanup().await
}
