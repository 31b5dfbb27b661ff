//! Idempotent keyspace and table creation.

use std::fmt;

use tracing::debug;

use crate::errors::ConfigurationRejection;
use crate::session::SchemaSession;

/// Replication settings of a keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Replication {
    /// `SimpleStrategy` with a single, cluster-wide replication factor.
    Simple {
        /// Number of replicas of each row.
        replication_factor: u32,
    },
    /// `NetworkTopologyStrategy` with a replication factor per datacenter.
    NetworkTopology {
        /// Pairs of datacenter name and its replication factor.
        datacenters: Vec<(String, u32)>,
    },
}

impl Default for Replication {
    /// Single-node replication: `SimpleStrategy` with replication factor 1.
    fn default() -> Self {
        Replication::Simple {
            replication_factor: 1,
        }
    }
}

impl fmt::Display for Replication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replication::Simple { replication_factor } => write!(
                f,
                "{{ 'class' : 'SimpleStrategy', 'replication_factor' : {} }}",
                replication_factor
            ),
            Replication::NetworkTopology { datacenters } => {
                write!(f, "{{ 'class' : 'NetworkTopologyStrategy'")?;
                for (datacenter, replication_factor) in datacenters {
                    // CQL string literals escape a quote by doubling it.
                    write!(
                        f,
                        ", '{}' : {}",
                        datacenter.replace('\'', "''"),
                        replication_factor
                    )?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// Compaction strategies used for time-series tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CompactionStrategy {
    /// `TimeWindowCompactionStrategy`, preferred where available.
    TimeWindow,
    /// `DateTieredCompactionStrategy`, for clusters that predate time windows.
    DateTiered,
}

impl CompactionStrategy {
    /// Name of the strategy class as known to the database.
    pub fn class_name(self) -> &'static str {
        match self {
            CompactionStrategy::TimeWindow => "TimeWindowCompactionStrategy",
            CompactionStrategy::DateTiered => "DateTieredCompactionStrategy",
        }
    }

    /// The clause appended to a `CREATE TABLE` statement to select this strategy.
    pub fn with_clause(self) -> String {
        format!(" with compaction = {{ 'class' : '{}' }}", self.class_name())
    }

    /// The strategy to try when the database rejects this one.
    pub fn fallback(self) -> Option<CompactionStrategy> {
        match self {
            CompactionStrategy::TimeWindow => Some(CompactionStrategy::DateTiered),
            CompactionStrategy::DateTiered => None,
        }
    }
}

impl fmt::Display for CompactionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Creates the keyspace, with single-node replication, unless it already exists.
///
/// Errors are returned exactly as the session reported them.
pub async fn ensure_keyspace<S>(session: &S, keyspace: &str) -> Result<(), S::Error>
where
    S: SchemaSession + ?Sized,
{
    ensure_keyspace_with(session, keyspace, &Replication::default()).await
}

/// Creates the keyspace with the given replication settings, unless it
/// already exists. An existing keyspace is left as it is.
pub async fn ensure_keyspace_with<S>(
    session: &S,
    keyspace: &str,
    replication: &Replication,
) -> Result<(), S::Error>
where
    S: SchemaSession + ?Sized,
{
    session
        .execute(&format!(
            "create keyspace if not exists {} with replication = {}",
            keyspace, replication
        ))
        .await
}

/// Executes `create_table` with the compaction clause of `strategy` appended.
pub async fn create_table_with_compaction<S>(
    session: &S,
    create_table: &str,
    strategy: CompactionStrategy,
) -> Result<(), S::Error>
where
    S: SchemaSession + ?Sized,
{
    session
        .execute(&format!("{}{}", create_table, strategy.with_clause()))
        .await
}

/// Executes `create_table` using time window compaction, or date tiered
/// compaction if the cluster does not support the former.
///
/// The fallback is attempted once, and only when the first attempt fails with
/// a [configuration rejection](ConfigurationRejection). Any other error, as
/// well as an error from the fallback attempt, is returned unchanged.
pub async fn create_table_with_time_series_compaction<S>(
    session: &S,
    create_table: &str,
) -> Result<(), S::Error>
where
    S: SchemaSession + ?Sized,
{
    let mut strategy = CompactionStrategy::TimeWindow;
    if let Err(err) = create_table_with_compaction(session, create_table, strategy).await {
        match strategy.fallback() {
            Some(fallback) if err.is_configuration_rejection() => {
                debug!(
                    "{} rejected, falling back to {}: {}",
                    strategy, fallback, err
                );
                strategy = fallback;
                create_table_with_compaction(session, create_table, strategy).await?;
            }
            _ => return Err(err),
        }
    }
    debug!("Created table using {}", strategy);
    Ok(())
}
