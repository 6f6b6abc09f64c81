use tracing::debug;

use crate::{
    constants::DEFAULT_CATEGORIES,
    domain::{self, Category, CategoryId, CategoryMap, Color},
    error::{CounterError, CounterResult},
    storage::{KeyValueStore, Store},
    time::Clock,
};

pub struct CategoryRegistry<'a, B, C> {
    store: &'a mut Store<B>,
    clock: &'a C,
}

impl<'a, B: KeyValueStore, C: Clock> CategoryRegistry<'a, B, C> {
    pub fn new(store: &'a mut Store<B>, clock: &'a C) -> Self {
        Self { store, clock }
    }

    pub fn list(&self) -> Vec<Category> {
        let mut categories = self.store.categories();
        categories.sort_by_key(|c| c.order);
        categories
    }

    pub fn get(&self, id: &CategoryId) -> Option<Category> {
        self.store.categories().into_iter().find(|c| &c.id == id)
    }

    pub fn category_map(&self) -> CategoryMap {
        domain::category_map(&self.store.categories())
    }

    pub fn resolve_name(&self, id: &CategoryId) -> String {
        domain::resolve_category_name(&self.category_map(), id).to_string()
    }

    pub fn add(&mut self, name: &str, color: Color) -> CounterResult<Category> {
        let name = validated_name(name)?;
        let mut categories = self.store.categories();

        let id = domain::generate_id("cat", self.clock.now_ms(), |candidate| {
            categories.iter().any(|c| c.id.as_str() == candidate)
        });
        let category = Category {
            id: CategoryId::new(id),
            name,
            color,
            order: categories.len(),
        };
        categories.push(category.clone());
        self.store.save_categories(&categories)?;

        debug!("Added category {} ({})", category.id, category.name);
        Ok(category)
    }

    pub fn update(&mut self, id: &CategoryId, name: &str, color: Color) -> CounterResult<bool> {
        let name = validated_name(name)?;
        let mut categories = self.store.categories();

        let Some(category) = categories.iter_mut().find(|c| &c.id == id) else {
            return Ok(false);
        };
        category.name = name;
        category.color = color;
        self.store.save_categories(&categories)?;

        debug!("Updated category {}", id);
        Ok(true)
    }

    pub fn delete(&mut self, id: &CategoryId) -> CounterResult<bool> {
        let mut categories = self.store.categories();
        let before = categories.len();
        categories.retain(|c| &c.id != id);
        if categories.len() == before {
            return Ok(false);
        }

        self.store.save_categories(&categories)?;
        debug!("Deleted category {}", id);
        Ok(true)
    }

    pub fn seed_if_empty(&mut self) -> CounterResult<bool> {
        if !self.list().is_empty() {
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let mut categories: Vec<Category> = Vec::with_capacity(DEFAULT_CATEGORIES.len());
        for (order, default) in DEFAULT_CATEGORIES.iter().enumerate() {
            let id = domain::generate_id("cat", now + order as i64, |candidate| {
                categories.iter().any(|c| c.id.as_str() == candidate)
            });
            categories.push(Category {
                id: CategoryId::new(id),
                name: default.name.to_string(),
                color: default.color,
                order,
            });
        }
        self.store.save_categories(&categories)?;

        debug!("Seeded {} default categories", categories.len());
        Ok(true)
    }
}

fn validated_name(name: &str) -> CounterResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CounterError::Validation);
    }
    Ok(trimmed.to_string())
}
