//! The navigation bar shown at the top of every page, and as a bottom bar on
//! small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Where a link sits in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    /// Always visible.
    Main,
    /// Reference data edited now and then.
    Lists,
    /// Rates, imports and housekeeping.
    Tools,
}

impl Group {
    fn title(self) -> &'static str {
        match self {
            Group::Main => "",
            Group::Lists => "Lists",
            Group::Tools => "Tools",
        }
    }
}

const LINKS: [(&str, &str, Group); 12] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard", Group::Main),
    (endpoints::TRANSACTIONS_VIEW, "Transactions", Group::Main),
    (endpoints::TRANSFERS_VIEW, "Transfers", Group::Main),
    (endpoints::BUDGETS_VIEW, "Budgets", Group::Main),
    (endpoints::ACCOUNTS_VIEW, "Accounts", Group::Lists),
    (endpoints::CATEGORIES_VIEW, "Categories", Group::Lists),
    (endpoints::PAYEES_VIEW, "Payees", Group::Lists),
    (endpoints::LOCATIONS_VIEW, "Locations", Group::Lists),
    (endpoints::PROJECTS_VIEW, "Projects", Group::Lists),
    (endpoints::EXCHANGE_RATES_VIEW, "Exchange Rates", Group::Tools),
    (endpoints::IMPORT_VIEW, "Import", Group::Tools),
    (endpoints::MAINTENANCE_VIEW, "Maintenance", Group::Tools),
];

const DROPDOWN_GROUPS: [Group; 2] = [Group::Lists, Group::Tools];

/// The main links on the bottom bar; everything else is under "More".
const BOTTOM_BAR_LINKS: [&str; 3] = [
    endpoints::DASHBOARD_VIEW,
    endpoints::TRANSACTIONS_VIEW,
    endpoints::ACCOUNTS_VIEW,
];

#[derive(Debug, Clone, Copy)]
struct Link {
    url: &'static str,
    title: &'static str,
    group: Group,
    is_current: bool,
}

fn link_style(is_current: bool) -> &'static str {
    if is_current {
        "block px-3 py-2 rounded-lg font-semibold text-blue-700 bg-blue-50 \
        dark:text-blue-200 dark:bg-blue-900/30"
    } else {
        "block px-3 py-2 rounded-lg text-gray-700 hover:text-blue-700 \
        hover:bg-gray-100 dark:text-gray-200 dark:hover:text-blue-200 \
        dark:hover:bg-gray-800"
    }
}

const DROPDOWN_STYLE: &str = "absolute z-50 mt-2 w-48 rounded-xl border border-gray-200 \
    bg-white p-2 shadow-xl dark:border-gray-700 dark:bg-gray-900";

/// The navigation bar for a page.
pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Create the navigation bar, marking the link for `active_endpoint` as
    /// the current page.
    pub fn new(active_endpoint: &str) -> NavBar {
        let links = LINKS
            .iter()
            .map(|&(url, title, group)| Link {
                url,
                title,
                group,
                is_current: url == active_endpoint,
            })
            .collect();

        NavBar { links }
    }

    fn group_links(&self, group: Group) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.group == group)
    }

    fn group_is_current(&self, group: Group) -> bool {
        self.group_links(group).any(|link| link.is_current)
    }

    fn dropdown(&self, group: Group) -> Markup {
        let is_current = self.group_is_current(group);

        html! {
            details class="relative"
            {
                summary
                    class={ "list-none cursor-pointer " (link_style(is_current)) }
                    aria-current=[is_current.then_some("page")]
                {
                    (group.title())
                }

                ul class=(DROPDOWN_STYLE)
                {
                    @for link in self.group_links(group) {
                        li { (link_markup(link)) }
                    }
                }
            }
        }
    }

    fn desktop_html(&self) -> Markup {
        html! {
            nav class="hidden lg:block bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                div class="max-w-screen-xl mx-auto flex items-center gap-6 p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="Delfin Logo" class="h-8";
                        span class="text-2xl font-semibold dark:text-white" { "Delfin" }
                    }

                    ul class="flex items-center gap-2 font-medium"
                    {
                        @for link in self.group_links(Group::Main) {
                            li { (link_markup(link)) }
                        }

                        @for group in DROPDOWN_GROUPS {
                            li { (self.dropdown(group)) }
                        }
                    }
                }
            }
        }
    }

    fn bottom_bar_html(&self) -> Markup {
        let (pinned, rest): (Vec<&Link>, Vec<&Link>) = self
            .links
            .iter()
            .partition(|link| BOTTOM_BAR_LINKS.contains(&link.url));
        let more_is_current = rest.iter().any(|link| link.is_current);

        html! {
            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                ul
                    class="mx-4 mb-4 grid grid-cols-4 gap-2 rounded-xl border border-gray-200
                    bg-white/95 p-3 text-xs shadow-lg backdrop-blur
                    dark:border-gray-700 dark:bg-gray-900/95"
                    aria-label="Primary"
                {
                    @for link in &pinned {
                        li class="min-w-0 text-center" { (link_markup(link)) }
                    }

                    li class="min-w-0 text-center"
                    {
                        details class="relative"
                        {
                            summary
                                class={ "list-none cursor-pointer " (link_style(more_is_current)) }
                                aria-current=[more_is_current.then_some("page")]
                            {
                                "More"
                            }

                            ul class={ (DROPDOWN_STYLE) " bottom-full right-0 mb-3 text-left" }
                            {
                                @for link in &rest {
                                    li { (link_markup(link)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Render both the desktop and small screen navigation bars.
    pub fn into_html(self) -> Markup {
        html! {
            (self.desktop_html())
            (self.bottom_bar_html())
        }
    }
}

fn link_markup(link: &Link) -> Markup {
    html! {
        a
            href=(link.url)
            class=(link_style(link.is_current))
            aria-current=[link.is_current.then_some("page")]
        {
            (link.title)
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    fn current_links(active_endpoint: &str) -> Vec<&'static str> {
        NavBar::new(active_endpoint)
            .links
            .iter()
            .filter(|link| link.is_current)
            .map(|link| link.url)
            .collect()
    }

    #[test]
    fn marks_only_the_active_page() {
        for endpoint in [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::MAINTENANCE_VIEW,
        ] {
            assert_eq!(current_links(endpoint), [endpoint]);
        }
    }

    #[test]
    fn pages_without_a_link_mark_nothing() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::TRANSACTIONS_API,
            endpoints::ACCOUNTS_API,
        ] {
            assert!(current_links(endpoint).is_empty(), "{endpoint}");
        }
    }

    #[test]
    fn dropdown_of_active_page_is_marked() {
        let html = NavBar::new(endpoints::PAYEES_VIEW).into_html().into_string();
        let document = Html::parse_fragment(&html);
        let selector = Selector::parse("details summary[aria-current=page]").unwrap();

        let marked: Vec<String> = document
            .select(&selector)
            .map(|summary| summary.text().collect())
            .collect();

        assert_eq!(marked, ["Lists", "More"]);
    }
}
