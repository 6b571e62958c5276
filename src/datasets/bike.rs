//! Bike sharing: predict long-term versus short-term rentals

use super::{defaults, num, DatasetDescriptor, DemoExample};
use crate::data::{FieldKind, Schema};
use crate::error::Result;
use crate::preprocessing::{EncodingPipeline, LabelRule, RangePolicy};
use std::sync::Arc;

fn schema() -> Result<Schema> {
    Schema::builder()
        .numeric("season")
        .numeric("month")
        .numeric("hour")
        .numeric("holiday")
        .numeric("weekday")
        .numeric("working_day")
        .numeric("weather_condition")
        .numeric("temperature")
        .numeric("humidity")
        .numeric("windspeed")
        .target(FieldKind::Boolean, "rental_type")
        .build()
}

fn pipeline(policy: RangePolicy) -> EncodingPipeline {
    EncodingPipeline::new(LabelRule::Binary)
        .min_max("temperature", policy)
        .min_max("humidity", policy)
        .min_max("windspeed", policy)
        .one_hot("season")
        .one_hot("month")
        .one_hot("hour")
        .one_hot("weather_condition")
        .one_hot("weekday")
        .pass_through("holiday")
        .pass_through("working_day")
        .concat(&[
            "season",
            "month",
            "hour",
            "holiday",
            "weekday",
            "working_day",
            "weather_condition",
            "temperature",
            "humidity",
            "windspeed",
        ])
}

pub(super) fn descriptor() -> Result<DatasetDescriptor> {
    Ok(DatasetDescriptor {
        name: "bike".to_string(),
        title: "Bike rental type prediction".to_string(),
        schema: Arc::new(schema()?),
        defaults: defaults(vec![
            ("season", num(1.0)),
            ("month", num(1.0)),
            ("weekday", num(1.0)),
            ("working_day", num(1.0)),
            ("weather_condition", num(1.0)),
        ]),
        examples: vec![DemoExample::new(
            "Summer weekday evening",
            vec![
                ("season", num(3.0)),
                ("month", num(7.0)),
                ("hour", num(18.0)),
                ("holiday", num(0.0)),
                ("weekday", num(2.0)),
                ("working_day", num(1.0)),
                ("weather_condition", num(1.0)),
                ("temperature", num(26.0)),
                ("humidity", num(55.0)),
                ("windspeed", num(10.0)),
            ],
        )],
        positive_name: "long-term".to_string(),
        negative_name: "short-term".to_string(),
        pipeline,
    })
}
