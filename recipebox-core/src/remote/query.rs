//! Table query description shared by the REST client and the fake backend.

/// Equality filter on a single column (`column=eq.value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn query_pair(&self) -> (String, String) {
        (self.column.clone(), format!("eq.{}", self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// How an embedded relation joins to the parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// The parent row holds the key: `parent[local_key] = related.id`.
    ToOne { local_key: String },
    /// The related rows hold the key: `related[foreign_key] = parent.id`.
    ToMany { foreign_key: String },
}

/// A related table projected into each parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub relation: String,
    pub columns: Vec<String>,
    pub join: Join,
}

impl Embed {
    pub fn one(relation: &str, local_key: &str, columns: &[&str]) -> Self {
        Self {
            relation: relation.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            join: Join::ToOne {
                local_key: local_key.to_string(),
            },
        }
    }

    pub fn many(relation: &str, foreign_key: &str, columns: &[&str]) -> Self {
        Self {
            relation: relation.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            join: Join::ToMany {
                foreign_key: foreign_key.to_string(),
            },
        }
    }

    fn select_clause(&self) -> String {
        format!("{}({})", self.relation, self.columns.join(","))
    }
}

/// A read against one table with optional embedded relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: vec!["*".to_string()],
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The `select=` projection, e.g. `*,categories(name,color)`.
    pub fn select_clause(&self) -> String {
        self.columns
            .iter()
            .cloned()
            .chain(self.embeds.iter().map(Embed::select_clause))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Query-string pairs in PostgREST syntax.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select_clause())];
        pairs.extend(self.filters.iter().map(Filter::query_pair));
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}
