use crate::model::ClusterService;
use std::cmp::Ordering;

pub const ITEMS_PER_PAGE: usize = 20;
const MAX_PAGE_MARKERS: usize = 5;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum HealthStatus {
    Overloaded,
    Normal,
    Warning,
}

impl HealthStatus {
    /// Aliases containing `production1` tolerate two running tasks before
    /// counting as overloaded; everything else trips at two.
    pub fn classify(service: &ClusterService, alias: &str) -> Self {
        let strict = alias.to_lowercase().contains("production1");
        let overloaded = if strict {
            service.running_tasks > 2
        } else {
            service.running_tasks >= 2
        };

        if overloaded {
            Self::Overloaded
        } else if service.running_tasks == 0 {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Overloaded => 3,
            Self::Normal => 2,
            Self::Warning => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overloaded => "overloaded",
            Self::Normal => "normal",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Overloaded,
    Normal,
    Warning,
}

impl StatusFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::Overloaded, Self::Normal, Self::Warning];

    pub fn admits(self, status: HealthStatus) -> bool {
        match self {
            Self::All => true,
            Self::Overloaded => status == HealthStatus::Overloaded,
            Self::Normal => status == HealthStatus::Normal,
            Self::Warning => status == HealthStatus::Warning,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Overloaded => "overloaded",
            Self::Normal => "normal",
            Self::Warning => "warning",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum SortKey {
    #[default]
    Tasks,
    Name,
    Cpu,
    Memory,
}

impl SortKey {
    pub const ALL: [Self; 4] = [Self::Tasks, Self::Name, Self::Cpu, Self::Memory];

    pub fn label(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Name => "name",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self)
    }

    fn compare(self, a: &ClusterService, b: &ClusterService) -> Ordering {
        match self {
            Self::Tasks => b.running_tasks.cmp(&a.running_tasks),
            Self::Name => a
                .service_name
                .to_lowercase()
                .cmp(&b.service_name.to_lowercase())
                .then_with(|| a.service_name.cmp(&b.service_name)),
            Self::Cpu => b.current_cpu.total_cmp(&a.current_cpu),
            Self::Memory => b.current_memory.total_cmp(&a.current_memory),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct FilterOptions {
    pub status: StatusFilter,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

/// Search, classify, filter and sort `clusters` for `alias`.
///
/// Under the `all` filter the health rank dominates and the `sort_by`
/// comparator only breaks rank ties. With a specific status filter every
/// pair goes through `sort_by`. Only the `sort_by` comparator honours
/// `sort_order`. The sort is stable, so full ties keep their input order.
pub fn derive_view(
    clusters: &[ClusterService],
    search: &str,
    filters: &FilterOptions,
    alias: &str,
) -> Vec<ClusterService> {
    let mut ranked = clusters
        .iter()
        .filter(|service| service.matches_search(search))
        .map(|service| (HealthStatus::classify(service, alias), service))
        .filter(|(status, _)| filters.status.admits(*status))
        .collect::<Vec<_>>();

    ranked.sort_by(|(a_status, a), (b_status, b)| {
        let mut ordering = b_status.rank().cmp(&a_status.rank());
        if ordering == Ordering::Equal || filters.status != StatusFilter::All {
            ordering = filters.sort_by.compare(a, b);
            if filters.sort_order == SortOrder::Asc {
                ordering = ordering.reverse();
            }
        }
        ordering
    });

    ranked
        .into_iter()
        .map(|(_, service)| service.clone())
        .collect()
}

pub fn total_pages(items: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    items.div_ceil(per_page)
}

/// 1-based page slice. Out-of-range pages are empty rather than an error.
pub fn page_slice<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PageMarker {
    Page(usize),
    Gap,
}

pub fn page_markers(current: usize, total: usize) -> Vec<PageMarker> {
    if total <= MAX_PAGE_MARKERS {
        return (1..=total).map(PageMarker::Page).collect();
    }

    let mut start = current.saturating_sub(1).max(2);
    let mut end = (current + 1).min(total - 1);
    if current <= 2 {
        end = 4;
    } else if current >= total - 1 {
        start = total - 3;
    }

    let mut markers = vec![PageMarker::Page(1)];
    if start > 2 {
        markers.push(PageMarker::Gap);
    }
    markers.extend((start..=end).map(PageMarker::Page));
    if end < total - 1 {
        markers.push(PageMarker::Gap);
    }
    markers.push(PageMarker::Page(total));
    markers
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Summary {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
    pub pending: usize,
    pub critical: usize,
}

impl Summary {
    pub fn from_services(clusters: &[ClusterService], alias: &str) -> Self {
        let mut summary = Self {
            total: clusters.len(),
            ..Self::default()
        };
        for service in clusters {
            if service.running_tasks > 0 {
                summary.running += 1;
            } else {
                summary.stopped += 1;
            }
            if service.pending_tasks > 0 {
                summary.pending += 1;
            }
            if HealthStatus::classify(service, alias) == HealthStatus::Overloaded {
                summary.critical += 1;
            }
        }
        summary
    }
}

fn cycle<T: Copy + PartialEq>(values: &[T], current: T) -> T {
    let index = values.iter().position(|value| *value == current).unwrap_or(0);
    values[(index + 1) % values.len()]
}

#[cfg(test)]
mod tests {
    use super::{
        FilterOptions, HealthStatus, ITEMS_PER_PAGE, PageMarker, SortKey, SortOrder,
        StatusFilter, Summary, derive_view, page_markers, page_slice, total_pages,
    };
    use crate::model::ClusterService;

    fn service(name: &str, running: u32) -> ClusterService {
        ClusterService {
            account_alias: "dev".to_string(),
            cluster_name: "dev-main-cluster".to_string(),
            service_name: name.to_string(),
            running_tasks: running,
            ..ClusterService::default()
        }
    }

    fn names(services: &[ClusterService]) -> Vec<&str> {
        services
            .iter()
            .map(|service| service.service_name.as_str())
            .collect()
    }

    #[test]
    fn two_tasks_split_between_dev_and_production1() {
        let two = service("web", 2);
        let three = service("api", 3);

        assert_eq!(HealthStatus::classify(&two, "dev"), HealthStatus::Overloaded);
        assert_eq!(
            HealthStatus::classify(&two, "production1"),
            HealthStatus::Normal
        );
        assert_eq!(
            HealthStatus::classify(&three, "dev"),
            HealthStatus::Overloaded
        );
        assert_eq!(
            HealthStatus::classify(&three, "PRODUCTION1"),
            HealthStatus::Overloaded
        );
    }

    #[test]
    fn classification_partitions_every_task_count() {
        for alias in ["dev", "eu-production1-b"] {
            let services = (0..8).map(|n| service("svc", n)).collect::<Vec<_>>();
            let mut counted = 0;
            for filter in [
                StatusFilter::Overloaded,
                StatusFilter::Normal,
                StatusFilter::Warning,
            ] {
                let options = FilterOptions {
                    status: filter,
                    ..FilterOptions::default()
                };
                counted += derive_view(&services, "", &options, alias).len();
            }
            assert_eq!(counted, services.len(), "alias {alias}");
        }
    }

    #[test]
    fn zero_tasks_is_warning_under_any_alias() {
        let idle = service("idle", 0);
        assert_eq!(HealthStatus::classify(&idle, "dev"), HealthStatus::Warning);
        assert_eq!(
            HealthStatus::classify(&idle, "production1"),
            HealthStatus::Warning
        );
    }

    #[test]
    fn search_filters_on_cluster_or_service_name() {
        let mut other = service("billing", 1);
        other.cluster_name = "payments".to_string();
        let services = vec![service("web", 1), other];

        let by_cluster = derive_view(&services, "PAY", &FilterOptions::default(), "dev");
        assert_eq!(names(&by_cluster), vec!["billing"]);

        let by_service = derive_view(&services, "we", &FilterOptions::default(), "dev");
        assert_eq!(names(&by_service), vec!["web"]);

        let none = derive_view(&services, "zzz", &FilterOptions::default(), "dev");
        assert!(none.is_empty());
    }

    #[test]
    fn all_filter_orders_by_rank_before_sort_key() {
        let services = vec![service("idle", 0), service("one", 1), service("busy", 4)];
        let options = FilterOptions {
            sort_order: SortOrder::Asc,
            ..FilterOptions::default()
        };

        let view = derive_view(&services, "", &options, "dev");
        assert_eq!(names(&view), vec!["busy", "one", "idle"]);
    }

    #[test]
    fn rank_ties_fall_back_to_sort_key_and_order() {
        let services = vec![service("a", 2), service("b", 5), service("c", 3)];

        let desc = derive_view(&services, "", &FilterOptions::default(), "dev");
        assert_eq!(names(&desc), vec!["b", "c", "a"]);

        let asc = FilterOptions {
            sort_order: SortOrder::Asc,
            ..FilterOptions::default()
        };
        let view = derive_view(&services, "", &asc, "dev");
        assert_eq!(names(&view), vec!["a", "c", "b"]);
    }

    #[test]
    fn specific_filter_sorts_by_key_only() {
        let mut low = service("zeta", 1);
        low.current_cpu = 10.0;
        let mut high = service("alpha", 1);
        high.current_cpu = 80.0;
        let services = vec![low, high];

        let by_cpu = FilterOptions {
            status: StatusFilter::Normal,
            sort_by: SortKey::Cpu,
            sort_order: SortOrder::Desc,
        };
        assert_eq!(
            names(&derive_view(&services, "", &by_cpu, "dev")),
            vec!["alpha", "zeta"]
        );

        let by_name = FilterOptions {
            status: StatusFilter::Normal,
            sort_by: SortKey::Name,
            sort_order: SortOrder::Desc,
        };
        assert_eq!(
            names(&derive_view(&services, "", &by_name, "dev")),
            vec!["alpha", "zeta"]
        );

        let by_name_asc = FilterOptions {
            sort_order: SortOrder::Asc,
            ..by_name
        };
        assert_eq!(
            names(&derive_view(&services, "", &by_name_asc, "dev")),
            vec!["zeta", "alpha"]
        );
    }

    #[test]
    fn full_ties_keep_input_order() {
        let services = vec![
            service("first", 1),
            service("second", 1),
            service("third", 1),
        ];
        let view = derive_view(&services, "", &FilterOptions::default(), "dev");
        assert_eq!(names(&view), vec!["first", "second", "third"]);
    }

    #[test]
    fn overloaded_filter_respects_alias_threshold() {
        let services = vec![service("two", 2), service("three", 3)];
        let options = FilterOptions {
            status: StatusFilter::Overloaded,
            ..FilterOptions::default()
        };

        assert_eq!(derive_view(&services, "", &options, "dev").len(), 2);
        let strict = derive_view(&services, "", &options, "production1");
        assert_eq!(names(&strict), vec!["three"]);
    }

    #[test]
    fn pagination_counts_and_empty_pages() {
        assert_eq!(total_pages(0, ITEMS_PER_PAGE), 0);
        assert_eq!(total_pages(20, ITEMS_PER_PAGE), 1);
        assert_eq!(total_pages(21, ITEMS_PER_PAGE), 2);

        let empty: Vec<u32> = Vec::new();
        assert!(page_slice(&empty, 1, ITEMS_PER_PAGE).is_empty());

        let items = (0..45).collect::<Vec<u32>>();
        assert_eq!(page_slice(&items, 1, ITEMS_PER_PAGE).len(), 20);
        assert_eq!(page_slice(&items, 3, ITEMS_PER_PAGE), &[40, 41, 42, 43, 44]);
        assert!(page_slice(&items, 4, ITEMS_PER_PAGE).is_empty());
    }

    #[test]
    fn page_markers_window_with_gaps() {
        use PageMarker::{Gap, Page};

        assert_eq!(page_markers(1, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(
            page_markers(1, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Gap, Page(10)]
        );
        assert_eq!(
            page_markers(5, 10),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Gap, Page(10)]
        );
        assert_eq!(
            page_markers(10, 10),
            vec![Page(1), Gap, Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn summary_counts_use_alias_policy() {
        let mut pending = service("queued", 2);
        pending.pending_tasks = 1;
        let services = vec![service("idle", 0), service("one", 1), pending];

        let dev = Summary::from_services(&services, "dev");
        assert_eq!(dev.total, 3);
        assert_eq!(dev.running, 2);
        assert_eq!(dev.stopped, 1);
        assert_eq!(dev.pending, 1);
        assert_eq!(dev.critical, 1);

        let prod = Summary::from_services(&services, "production1");
        assert_eq!(prod.critical, 0);
    }

    #[test]
    fn filter_and_sort_cycles_wrap() {
        assert_eq!(StatusFilter::Warning.next(), StatusFilter::All);
        assert_eq!(SortKey::Memory.next(), SortKey::Tasks);
        assert_eq!(SortOrder::Desc.flipped(), SortOrder::Asc);
    }
}
