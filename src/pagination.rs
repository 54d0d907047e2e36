//! Paging for long listings: the page links shown under a table and the
//! arithmetic behind them.

use std::ops::RangeInclusive;

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum transactions to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// One entry in the row of page links.
#[derive(Debug, PartialEq, Eq)]
pub enum PageLink {
    Back(u64),
    Page(u64),
    Current(u64),
    Gap,
    Next(u64),
}

/// The page being shown out of how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    /// 1-based, always within `1..=page_count`.
    pub current: u64,
    pub page_count: u64,
    pub per_page: u64,
}

impl Pager {
    /// Clamp `requested_page` to the pages needed for `item_count` items.
    /// An empty listing still has one (empty) page.
    pub fn new(requested_page: u64, item_count: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let page_count = item_count.div_ceil(per_page).max(1);

        Self {
            current: requested_page.clamp(1, page_count),
            page_count,
            per_page,
        }
    }

    /// How many items come before the current page.
    pub fn offset(&self) -> u64 {
        (self.current - 1) * self.per_page
    }

    /// The pages listed by number, at most `max_pages` wide and centred on
    /// the current page where possible.
    fn window(&self, max_pages: u64) -> RangeInclusive<u64> {
        let width = max_pages.clamp(1, self.page_count);
        let start = self
            .current
            .saturating_sub(max_pages / 2)
            .clamp(1, self.page_count - width + 1);

        start..=(start + width - 1)
    }

    /// The links to show: back/next buttons, the window around the current
    /// page, and the first and last pages when the window leaves them out.
    pub fn links(&self, max_pages: u64) -> Vec<PageLink> {
        let window = self.window(max_pages);
        let (first, last) = (*window.start(), *window.end());
        let mut links = Vec::new();

        if self.current > 1 {
            links.push(PageLink::Back(self.current - 1));
        }

        if first > 1 {
            links.push(PageLink::Page(1));
        }
        if first > 2 {
            links.push(PageLink::Gap);
        }

        links.extend(window.map(|page| {
            if page == self.current {
                PageLink::Current(page)
            } else {
                PageLink::Page(page)
            }
        }));

        if last + 1 < self.page_count {
            links.push(PageLink::Gap);
        }
        if last < self.page_count {
            links.push(PageLink::Page(self.page_count));
        }

        if self.current < self.page_count {
            links.push(PageLink::Next(self.current + 1));
        }

        links
    }
}

/// Renders the page links. `page_url` builds the link for a page number.
pub fn pagination_view(links: &[PageLink], page_url: impl Fn(u64) -> String) -> Markup {
    let link_style = "block px-3 py-2 rounded-sm text-blue-600 hover:underline dark:text-blue-400";

    html! {
        nav class="pagination flex justify-center" aria-label="Pages"
        {
            ul class="flex flex-wrap items-center gap-x-2"
            {
                @for link in links {
                    li
                    {
                        @match link {
                            PageLink::Back(page) => {
                                a href=(page_url(*page)) rel="prev" class=(link_style) { "Back" }
                            }
                            PageLink::Page(page) => {
                                a href=(page_url(*page)) class=(link_style) { (page) }
                            }
                            PageLink::Current(page) => {
                                span
                                    aria-current="page"
                                    class="block px-3 py-2 font-bold text-gray-900 dark:text-white"
                                { (page) }
                            }
                            PageLink::Gap => {
                                span class="px-1 text-gray-500" { "…" }
                            }
                            PageLink::Next(page) => {
                                a href=(page_url(*page)) rel="next" class=(link_style) { "Next" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::pagination::{
        PageLink::{Back, Current, Gap, Next, Page},
        Pager, pagination_view,
    };

    #[test]
    fn clamps_requested_page() {
        assert_eq!(Pager::new(0, 45, 20).current, 1);
        assert_eq!(Pager::new(9, 45, 20).current, 3);
        assert_eq!(Pager::new(9, 45, 20).offset(), 40);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let pager = Pager::new(3, 0, 20);

        assert_eq!(pager.page_count, 1);
        assert_eq!(pager.offset(), 0);
        assert_eq!(pager.links(5), [Current(1)]);
    }

    #[test]
    fn few_pages_are_all_listed() {
        assert_eq!(
            Pager::new(1, 100, 20).links(5),
            [Current(1), Page(2), Page(3), Page(4), Page(5), Next(2)]
        );
    }

    #[test]
    fn window_sticks_to_the_start() {
        assert_eq!(
            Pager::new(2, 200, 20).links(5),
            [
                Back(1),
                Page(1),
                Current(2),
                Page(3),
                Page(4),
                Page(5),
                Gap,
                Page(10),
                Next(3)
            ]
        );
    }

    #[test]
    fn window_sticks_to_the_end() {
        assert_eq!(
            Pager::new(10, 200, 20).links(5),
            [
                Back(9),
                Page(1),
                Gap,
                Page(6),
                Page(7),
                Page(8),
                Page(9),
                Current(10)
            ]
        );
    }

    #[test]
    fn window_centres_on_current_page() {
        assert_eq!(
            Pager::new(5, 200, 20).links(5),
            [
                Back(4),
                Page(1),
                Gap,
                Page(3),
                Page(4),
                Current(5),
                Page(6),
                Page(7),
                Gap,
                Page(10),
                Next(6)
            ]
        );
    }

    #[test]
    fn no_gap_next_to_first_page() {
        let links = Pager::new(4, 200, 20).links(5);

        assert_eq!(links[..3], [Back(3), Page(1), Page(2)]);
    }

    #[test]
    fn view_links_pages_and_marks_current_page() {
        let links = Pager::new(2, 50, 20).links(5);

        let html = Html::parse_fragment(
            &pagination_view(&links, |page| format!("/transactions?page={page}")).into_string(),
        );

        let current = html
            .select(&Selector::parse("[aria-current=page]").unwrap())
            .next()
            .expect("no current page");
        assert_eq!(current.text().collect::<String>(), "2");

        let hrefs: Vec<&str> = html
            .select(&Selector::parse("nav.pagination a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(
            hrefs,
            [
                "/transactions?page=1",
                "/transactions?page=1",
                "/transactions?page=3",
                "/transactions?page=3",
            ]
        );
    }
}
