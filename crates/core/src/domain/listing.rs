use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw listing inputs as they arrive from the boundary layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Whitelisted sort column for one entity kind.
pub trait SortField: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    const DEFAULT: Self;

    fn parse(value: &str) -> Option<Self>;

    /// Column name; doubles as the cache-key token.
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentSort {
    Id,
    CreatedAt,
    UpdatedAt,
}

impl SortField for CommentSort {
    const DEFAULT: Self = CommentSort::CreatedAt;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(CommentSort::Id),
            "created_at" => Some(CommentSort::CreatedAt),
            "updated_at" => Some(CommentSort::UpdatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            CommentSort::Id => "id",
            CommentSort::CreatedAt => "created_at",
            CommentSort::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostSort {
    Id,
    CreatedAt,
    Title,
}

impl SortField for PostSort {
    const DEFAULT: Self = PostSort::CreatedAt;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(PostSort::Id),
            "created_at" => Some(PostSort::CreatedAt),
            "title" => Some(PostSort::Title),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            PostSort::Id => "id",
            PostSort::CreatedAt => "created_at",
            PostSort::Title => "title",
        }
    }
}

/// Normalized listing request. Every field is within bounds once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<S> {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub sort_by: S,
    pub sort_order: SortOrder,
}

impl<S: SortField> ListQuery<S> {
    pub fn normalize(params: ListParams) -> Self {
        let page = match params.page {
            Some(page) if page >= 1 => u32::try_from(page).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE,
        };
        let page_size = match params.page_size {
            Some(size) if size >= 1 => {
                u32::try_from(size.min(i64::from(MAX_PAGE_SIZE))).unwrap_or(MAX_PAGE_SIZE)
            }
            _ => DEFAULT_PAGE_SIZE,
        };
        let search = params
            .search
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let sort_by = params
            .sort_by
            .as_deref()
            .and_then(S::parse)
            .unwrap_or(S::DEFAULT);
        let sort_order = params
            .sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or(SortOrder::Desc);
        Self {
            page,
            page_size,
            search,
            sort_by,
            sort_order,
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl<S: SortField> Default for ListQuery<S> {
    fn default() -> Self {
        Self::normalize(ListParams::default())
    }
}

/// One page of a listing together with its pagination flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
            has_next: i64::from(page) * i64::from(page_size) < total,
            has_prev: page > 1,
        }
    }

    /// Wraps a single materialized value, used for subtree reads.
    pub fn single(item: T) -> Self {
        Self::new(vec![item], 1, 1, 1)
    }
}
