//! Shared entity fixtures for unit tests: a `users` table with a to-many
//! relation to `posts` and a to-one relation to `profiles`.

use crate::engine::{row_from, Row};
use crate::entity::{Entity, EntityDescriptor, FieldAccess, FieldDescriptor, Snapshot};
use crate::error::EntityError;
use crate::relation::{RelationDef, RelationLoader};
use crate::repository::{Registry, Repository};
use crate::test_helpers::MockEngine;
use crate::value::{get_bool, get_i64, get_string};
use sea_query::Value;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub age: i64,
    pub active: bool,
    pub posts: Vec<Post>,
    pub profile: Option<Profile>,
    original: Snapshot,
}

#[derive(Clone, Debug, Default)]
pub struct Post {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    original: Snapshot,
}

#[derive(Clone, Debug, Default)]
pub struct Profile {
    pub id: Option<i64>,
    pub user_id: i64,
    pub bio: String,
    original: Snapshot,
}

fn user_name(u: &User) -> Value {
    Value::String(Some(u.name.clone()))
}

fn user_age(u: &User) -> Value {
    Value::BigInt(Some(u.age))
}

fn user_active(u: &User) -> bool {
    u.active
}

fn set_user_posts(u: &mut User, posts: Vec<Post>) {
    u.posts = posts;
}

fn set_user_profile(u: &mut User, profile: Option<Profile>) {
    u.profile = profile;
}

static USER_FIELDS: [FieldDescriptor<User>; 4] = [
    FieldDescriptor {
        name: "id",
        column: "id",
        access: FieldAccess::Identity,
    },
    FieldDescriptor {
        name: "name",
        column: "name",
        access: FieldAccess::Value(user_name),
    },
    FieldDescriptor {
        name: "age",
        column: "age",
        access: FieldAccess::Value(user_age),
    },
    FieldDescriptor {
        name: "isActive",
        column: "is_active",
        access: FieldAccess::Flag(user_active),
    },
];

static USER_POSTS: RelationDef<User, Post> =
    RelationDef::many("posts", "id", "user_id", set_user_posts);

static USER_PROFILE: RelationDef<User, Profile> =
    RelationDef::one("profile", "id", "user_id", set_user_profile);

static USER_RELATIONS: [&dyn RelationLoader<User>; 2] = [&USER_POSTS, &USER_PROFILE];

static USER_DESCRIPTOR: EntityDescriptor<User> = EntityDescriptor {
    entity: "User",
    fields: &USER_FIELDS,
    relations: &USER_RELATIONS,
};

impl Entity for User {
    fn descriptor() -> &'static EntityDescriptor<Self> {
        &USER_DESCRIPTOR
    }

    fn from_row(row: &Row) -> Result<Self, EntityError> {
        Ok(User {
            id: get_i64(row, "id"),
            name: get_string(row, "name")
                .ok_or_else(|| EntityError::Parse("users row missing column `name`".to_string()))?,
            age: get_i64(row, "age")
                .ok_or_else(|| EntityError::Parse("users row missing column `age`".to_string()))?,
            active: get_bool(row, "is_active").unwrap_or(false),
            posts: Vec::new(),
            profile: None,
            original: Snapshot::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn original_snapshot(&self) -> &Snapshot {
        &self.original
    }

    fn set_original_snapshot(&mut self, snapshot: Snapshot) {
        self.original = snapshot;
    }
}

fn post_user_id(p: &Post) -> Value {
    Value::BigInt(Some(p.user_id))
}

fn post_title(p: &Post) -> Value {
    Value::String(Some(p.title.clone()))
}

static POST_FIELDS: [FieldDescriptor<Post>; 3] = [
    FieldDescriptor {
        name: "id",
        column: "id",
        access: FieldAccess::Identity,
    },
    FieldDescriptor {
        name: "userId",
        column: "user_id",
        access: FieldAccess::Value(post_user_id),
    },
    FieldDescriptor {
        name: "title",
        column: "title",
        access: FieldAccess::Value(post_title),
    },
];

static POST_DESCRIPTOR: EntityDescriptor<Post> = EntityDescriptor {
    entity: "Post",
    fields: &POST_FIELDS,
    relations: &[],
};

impl Entity for Post {
    fn descriptor() -> &'static EntityDescriptor<Self> {
        &POST_DESCRIPTOR
    }

    fn from_row(row: &Row) -> Result<Self, EntityError> {
        Ok(Post {
            id: get_i64(row, "id"),
            user_id: get_i64(row, "user_id").ok_or_else(|| {
                EntityError::Parse("posts row missing column `user_id`".to_string())
            })?,
            title: get_string(row, "title").unwrap_or_default(),
            original: Snapshot::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn original_snapshot(&self) -> &Snapshot {
        &self.original
    }

    fn set_original_snapshot(&mut self, snapshot: Snapshot) {
        self.original = snapshot;
    }
}

fn profile_user_id(p: &Profile) -> Value {
    Value::BigInt(Some(p.user_id))
}

fn profile_bio(p: &Profile) -> Value {
    Value::String(Some(p.bio.clone()))
}

static PROFILE_FIELDS: [FieldDescriptor<Profile>; 3] = [
    FieldDescriptor {
        name: "id",
        column: "id",
        access: FieldAccess::Identity,
    },
    FieldDescriptor {
        name: "userId",
        column: "user_id",
        access: FieldAccess::Value(profile_user_id),
    },
    FieldDescriptor {
        name: "bio",
        column: "bio",
        access: FieldAccess::Value(profile_bio),
    },
];

static PROFILE_DESCRIPTOR: EntityDescriptor<Profile> = EntityDescriptor {
    entity: "Profile",
    fields: &PROFILE_FIELDS,
    relations: &[],
};

impl Entity for Profile {
    fn descriptor() -> &'static EntityDescriptor<Self> {
        &PROFILE_DESCRIPTOR
    }

    fn from_row(row: &Row) -> Result<Self, EntityError> {
        Ok(Profile {
            id: get_i64(row, "id"),
            user_id: get_i64(row, "user_id").ok_or_else(|| {
                EntityError::Parse("profiles row missing column `user_id`".to_string())
            })?,
            bio: get_string(row, "bio").unwrap_or_default(),
            original: Snapshot::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn original_snapshot(&self) -> &Snapshot {
        &self.original
    }

    fn set_original_snapshot(&mut self, snapshot: Snapshot) {
        self.original = snapshot;
    }
}

pub fn user(id: Option<i64>, name: &str, age: i64, active: bool) -> User {
    User {
        id,
        name: name.to_string(),
        age,
        active,
        ..User::default()
    }
}

pub fn user_row(id: i64, name: &str, age: i64, active: bool) -> Row {
    row_from([
        ("id", Value::BigInt(Some(id))),
        ("name", Value::String(Some(name.to_string()))),
        ("age", Value::BigInt(Some(age))),
        ("is_active", Value::Int(Some(i32::from(active)))),
    ])
}

pub fn post_row(id: i64, user_id: i64, title: &str) -> Row {
    row_from([
        ("id", Value::BigInt(Some(id))),
        ("user_id", Value::BigInt(Some(user_id))),
        ("title", Value::String(Some(title.to_string()))),
    ])
}

pub fn profile_row(id: i64, user_id: i64, bio: &str) -> Row {
    row_from([
        ("id", Value::BigInt(Some(id))),
        ("user_id", Value::BigInt(Some(user_id))),
        ("bio", Value::String(Some(bio.to_string()))),
    ])
}

/// A registry with `users`, `posts` and `profiles` repositories sharing
/// one mock engine.
pub fn registry_with(engine: Arc<MockEngine>) -> Registry {
    let mut registry = Registry::new();
    registry.register(Repository::<User>::new(engine.clone(), "users"));
    registry.register(Repository::<Post>::new(engine.clone(), "posts"));
    registry.register(Repository::<Profile>::new(engine, "profiles"));
    registry
}
