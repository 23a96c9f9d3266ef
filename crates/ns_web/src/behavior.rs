use chrono::Utc;
use ns_core::{KvStore, Notification, NotificationKind, Result, UserBehavior};
use std::sync::Arc;

const MAX_SEARCHES: usize = 10;
const MAX_CLICKS: usize = 50;
const MAX_NOTIFICATIONS: usize = 20;
/// Every Nth view of a category produces a notification.
const CATEGORY_NOTIFY_EVERY: u32 = 5;
const RECENT_SEARCHES: usize = 5;

/// Records per-user browsing behavior and derives local notifications from
/// it. State lives behind the key-value store so a server-backed store can
/// replace the local one without touching call sites.
pub struct BehaviorTracker {
    kv: Arc<dyn KvStore>,
}

impl BehaviorTracker {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn behavior_key(user_id: &str) -> String {
        format!("behavior:{}", user_id)
    }

    fn notifications_key(user_id: &str) -> String {
        format!("notifications:{}", user_id)
    }

    pub async fn behavior(&self, user_id: &str) -> Result<UserBehavior> {
        match self.kv.get(&Self::behavior_key(user_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(UserBehavior::default()),
        }
    }

    async fn save_behavior(&self, user_id: &str, behavior: &UserBehavior) -> Result<()> {
        self.kv
            .put(&Self::behavior_key(user_id), &serde_json::to_string(behavior)?)
            .await
    }

    pub async fn notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        match self.kv.get(&Self::notifications_key(user_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_notifications(
        &self,
        user_id: &str,
        notifications: &[Notification],
    ) -> Result<()> {
        self.kv
            .put(
                &Self::notifications_key(user_id),
                &serde_json::to_string(notifications)?,
            )
            .await
    }

    async fn push_notification(&self, user_id: &str, notification: Notification) -> Result<()> {
        let mut notifications = self.notifications(user_id).await?;
        notifications.insert(0, notification);
        notifications.truncate(MAX_NOTIFICATIONS);
        self.save_notifications(user_id, &notifications).await
    }

    pub async fn track_search(&self, user_id: &str, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        let mut behavior = self.behavior(user_id).await?;
        behavior.searches.retain(|s| s != query);
        behavior.searches.push(query.to_string());
        if behavior.searches.len() > MAX_SEARCHES {
            let excess = behavior.searches.len() - MAX_SEARCHES;
            behavior.searches.drain(..excess);
        }
        self.save_behavior(user_id, &behavior).await?;

        self.push_notification(
            user_id,
            Notification {
                id: format!("search_{}", Utc::now().timestamp_millis()),
                title: "New articles found!".to_string(),
                message: format!("Fresh articles about \"{}\" are available", query),
                kind: NotificationKind::Search,
                article_url: None,
                timestamp: Utc::now(),
                read: false,
            },
        )
        .await
    }

    pub async fn track_category_view(&self, user_id: &str, category: &str) -> Result<()> {
        if category.is_empty() {
            return Ok(());
        }

        let mut behavior = self.behavior(user_id).await?;
        let count = behavior
            .viewed_categories
            .entry(category.to_string())
            .or_insert(0);
        *count += 1;
        let count = *count;
        self.save_behavior(user_id, &behavior).await?;

        if count % CATEGORY_NOTIFY_EVERY == 0 {
            self.push_notification(
                user_id,
                Notification {
                    id: format!("category_{}_{}", category, Utc::now().timestamp_millis()),
                    title: format!("{} news update", category),
                    message: format!(
                        "New trending articles in {} - your favorite category!",
                        category
                    ),
                    kind: NotificationKind::Category,
                    article_url: None,
                    timestamp: Utc::now(),
                    read: false,
                },
            )
            .await?;
        }
        Ok(())
    }

    pub async fn track_article_click(&self, user_id: &str, article_url: &str) -> Result<()> {
        if article_url.is_empty() {
            return Ok(());
        }

        let mut behavior = self.behavior(user_id).await?;
        behavior.clicked_articles.retain(|u| u != article_url);
        behavior.clicked_articles.push(article_url.to_string());
        if behavior.clicked_articles.len() > MAX_CLICKS {
            let excess = behavior.clicked_articles.len() - MAX_CLICKS;
            behavior.clicked_articles.drain(..excess);
        }
        self.save_behavior(user_id, &behavior).await
    }

    pub async fn mark_notification_read(&self, user_id: &str, id: &str) -> Result<()> {
        let mut notifications = self.notifications(user_id).await?;
        for notification in notifications.iter_mut() {
            if notification.id == id {
                notification.read = true;
            }
        }
        self.save_notifications(user_id, &notifications).await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        let mut notifications = self.notifications(user_id).await?;
        for notification in notifications.iter_mut() {
            notification.read = true;
        }
        self.save_notifications(user_id, &notifications).await
    }

    pub async fn delete_notification(&self, user_id: &str, id: &str) -> Result<()> {
        let mut notifications = self.notifications(user_id).await?;
        notifications.retain(|n| n.id != id);
        self.save_notifications(user_id, &notifications).await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .notifications(user_id)
            .await?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    pub async fn most_viewed_category(&self, user_id: &str) -> Result<Option<String>> {
        let behavior = self.behavior(user_id).await?;
        Ok(behavior
            .viewed_categories
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(category, _)| category))
    }

    pub async fn recent_searches(&self, user_id: &str) -> Result<Vec<String>> {
        let behavior = self.behavior(user_id).await?;
        let skip = behavior.searches.len().saturating_sub(RECENT_SEARCHES);
        Ok(behavior.searches.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_storage::MemoryStorage;

    async fn tracker() -> BehaviorTracker {
        BehaviorTracker::new(Arc::new(MemoryStorage::new().await.unwrap()))
    }

    #[tokio::test]
    async fn test_search_tracking_dedups_and_caps() {
        let tracker = tracker().await;
        for i in 0..12 {
            tracker
                .track_search("alice", &format!("query {}", i))
                .await
                .unwrap();
        }
        tracker.track_search("alice", "query 11").await.unwrap();

        let behavior = tracker.behavior("alice").await.unwrap();
        assert_eq!(behavior.searches.len(), MAX_SEARCHES);
        // Re-searching moves the query to the end without duplicating it.
        assert_eq!(behavior.searches.last().unwrap(), "query 11");
        assert_eq!(
            behavior.searches.iter().filter(|s| *s == "query 11").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_search_produces_notification() {
        let tracker = tracker().await;
        tracker.track_search("alice", "elections").await.unwrap();

        let notifications = tracker.notifications("alice").await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Search);
        assert!(notifications[0].message.contains("elections"));
        assert_eq!(tracker.unread_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_notification_every_fifth_view() {
        let tracker = tracker().await;
        for _ in 0..4 {
            tracker
                .track_category_view("alice", "technology")
                .await
                .unwrap();
        }
        assert!(tracker.notifications("alice").await.unwrap().is_empty());

        tracker
            .track_category_view("alice", "technology")
            .await
            .unwrap();
        let notifications = tracker.notifications("alice").await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Category);
    }

    #[tokio::test]
    async fn test_click_tracking_caps_at_fifty() {
        let tracker = tracker().await;
        for i in 0..60 {
            tracker
                .track_article_click("alice", &format!("http://t.com/{}", i))
                .await
                .unwrap();
        }
        let behavior = tracker.behavior("alice").await.unwrap();
        assert_eq!(behavior.clicked_articles.len(), MAX_CLICKS);
        assert_eq!(behavior.clicked_articles.last().unwrap(), "http://t.com/59");
    }

    #[tokio::test]
    async fn test_notifications_are_capped_newest_first() {
        let tracker = tracker().await;
        for i in 0..25 {
            tracker
                .track_search("alice", &format!("query {}", i))
                .await
                .unwrap();
        }

        let notifications = tracker.notifications("alice").await.unwrap();
        assert_eq!(notifications.len(), MAX_NOTIFICATIONS);
        // Newest at the front; the oldest five were dropped.
        assert!(notifications[0].message.contains("query 24"));
        assert!(notifications
            .last()
            .unwrap()
            .message
            .contains("query 5"));
    }

    #[tokio::test]
    async fn test_notification_read_and_delete() {
        let tracker = tracker().await;
        tracker.track_search("alice", "one").await.unwrap();
        tracker.track_search("alice", "two").await.unwrap();

        let notifications = tracker.notifications("alice").await.unwrap();
        let first_id = notifications[0].id.clone();

        tracker
            .mark_notification_read("alice", &first_id)
            .await
            .unwrap();
        assert_eq!(tracker.unread_count("alice").await.unwrap(), 1);

        tracker.mark_all_read("alice").await.unwrap();
        assert_eq!(tracker.unread_count("alice").await.unwrap(), 0);

        tracker
            .delete_notification("alice", &first_id)
            .await
            .unwrap();
        assert_eq!(tracker.notifications("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_most_viewed_category_and_recent_searches() {
        let tracker = tracker().await;
        assert!(tracker
            .most_viewed_category("alice")
            .await
            .unwrap()
            .is_none());

        tracker.track_category_view("alice", "health").await.unwrap();
        tracker
            .track_category_view("alice", "technology")
            .await
            .unwrap();
        tracker
            .track_category_view("alice", "technology")
            .await
            .unwrap();
        assert_eq!(
            tracker.most_viewed_category("alice").await.unwrap(),
            Some("technology".to_string())
        );

        for query in ["a1", "b2", "c3", "d4", "e5", "f6"] {
            tracker.track_search("alice", query).await.unwrap();
        }
        let recent = tracker.recent_searches("alice").await.unwrap();
        assert_eq!(recent, vec!["b2", "c3", "d4", "e5", "f6"]);
    }
}
