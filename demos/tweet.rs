//! Run with `cargo run --example tweet`.

use sovran_coerce::{
    builtin, Class, ContainerType, ConversionError, DeepFind, Instance, Target, Value,
};
use std::any::Any;

#[derive(Debug)]
struct User {
    class: Class,
    handle: String,
}

impl Instance for User {
    fn class(&self) -> Class {
        self.class.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let user = Class::builder("User")
        .construct(|class, value| {
            let handle = value
                .as_map()
                .and_then(|map| map.get(&Value::sym("handle")))
                .and_then(Value::as_str)
                .ok_or_else(|| ConversionError::custom("missing :handle"))?;
            Ok(Value::object(User {
                class: class.clone(),
                handle: handle.to_string(),
            }))
        })
        .build();

    let tweet = ContainerType::define("Tweet");
    tweet
        .coerce_key("user", &user)
        .coerce_keys(["retweets", "likes"], Target::integer())
        .coerce_key("hashtags", Target::set(Target::symbol()))
        .coerce_value(&builtin::float(), Target::rational());

    let map = tweet.instantiate();
    map.set(Value::sym("user"), Value::map([(Value::sym("handle"), "@bob")]))?;
    map.set(Value::sym("retweets"), "12")?;
    map.set(Value::sym("likes"), 40.7)?;
    map.set(Value::sym("hashtags"), Value::array(["rust", "ruby", "rust"]))?;
    map.set(Value::sym("score"), 0.75)?;
    map.set(Value::sym("count"), "5")?;

    map.apply(|key, value| {
        println!("{key} => {value}");
        Ok::<(), std::convert::Infallible>(())
    })?;

    let handle = map.with_object(Value::sym("user"), |u: &User| u.handle.clone())?;
    println!("posted by {handle}");

    if let Err(e) = map.set(Value::sym("retweets"), Value::array([1, 2])) {
        println!("rejected: {e}");
    }

    println!("first handle anywhere: {:?}", map.deep_find(&Value::sym("handle")));
    Ok(())
}
