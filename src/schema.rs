use std::sync::Arc;

/// Column order of the comment extract. Thread fields first, then the comment
/// identity fields, then the Pushshift passthrough attributes.
pub const COMMENT_FIELDS: &[&str] = &[
    "thread_id",
    "thread_created_utc",
    "id",
    "created_utc",
    "author",
    "parent_id",
    "body",
    "all_awardings",
    "approved_at_utc",
    "associated_award",
    "author_flair_background_color",
    "author_flair_css_class",
    "author_flair_richtext",
    "author_flair_template_id",
    "author_flair_text",
    "author_flair_text_color",
    "author_flair_type",
    "author_fullname",
    "author_patreon_flair",
    "author_premium",
    "awarders",
    "banned_at_utc",
    "can_mod_post",
    "collapsed",
    "collapsed_because_crowd_control",
    "collapsed_reason",
    "comment_type",
    "distinguished",
    "edited",
    "gildings",
    "is_submitter",
    "link_id",
    "locked",
    "no_follow",
    "permalink",
    "retrieved_on",
    "score",
    "send_replies",
    "stickied",
    "subreddit",
    "subreddit_id",
    "top_awarded_type",
    "total_awards_received",
    "treatment_tags",
];

/// Immutable, ordered column list shared by every component that reads or
/// writes comment rows. Cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    fields: Arc<[String]>,
}

impl Schema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    /// The full comment schema used for the on-disk store.
    pub fn comments() -> Self {
        Self::new(COMMENT_FIELDS.iter().copied())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Comma-joined projection, as the search endpoints expect in `fields=`.
    pub fn projection(&self) -> String {
        self.fields.join(",")
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::comments()
    }
}
