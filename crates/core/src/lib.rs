mod backup;
mod config;
mod container;
mod date_format;
mod exif_reader;
mod hash;
mod media;
mod metadata;
mod organizer;
mod placement;
mod report;
mod resolver;
mod shell_props;
#[cfg(test)]
mod test_support;

pub use backup::{backup_path, move_to_backup, BackupError};
pub use config::{app_paths, load_config, load_config_from, AppConfig, AppPaths};
pub use container::{read_container_dates, ContainerDates, ContainerError};
pub use hash::{hash_file, same_content, ContentHash};
pub use media::{ExtensionFilter, MediaItem, MediaKind};
pub use metadata::{MetadataSource, ResolvedDate};
pub use organizer::{organize, FileOutcome, OrganizeOptions, RunSummary, SkipReason};
pub use placement::{
    assign_target, candidate_name, destination_dir, place, Category, NamingPolicy, Placement,
    PlacementError, MAX_SEQUENCE,
};
pub use report::{CollectingReporter, Diagnostic, Reporter, Severity, TracingReporter};
pub use resolver::{last_write_date, resolve_date, ResolverOptions, DEFAULT_MIN_PLAUSIBLE_YEAR};
